//! Stencil Generator Library
//!
//! Static site generation engine for Stencil.
//!
//! # Modules
//!
//! - [`engine`] - Handlebars template engine with site helpers
//! - [`layout`] - Named layouts and chain resolution
//! - [`variables`] - The `site` namespace and collection summaries
//! - [`markdown`] - Markdown to HTML conversion
//! - [`render`] - Rendering of individual content items
//! - [`output`] - Writing pages and copying assets
//! - [`collector`] - Loading content and layouts from disk
//! - [`build`] - Build orchestration

pub mod build;
pub mod collector;
pub mod engine;
pub mod layout;
pub mod markdown;
pub mod output;
pub mod render;
pub mod variables;

pub use build::{BuildError, BuildStats, Builder, ItemFailure};
pub use collector::{ContentCollector, load_layouts};
pub use engine::TemplateEngine;
pub use layout::{Layout, LayoutError, LayoutRegistry};
pub use markdown::MarkdownRenderer;
pub use output::OutputWriter;
pub use render::{ElementRenderer, RenderError};
pub use variables::{CollectionEntry, CollectionError, PageVariables, SiteVariables};
