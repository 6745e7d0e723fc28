//! Stencil Core Library
//!
//! Core types, configuration, and error handling for the Stencil static site generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;

pub use config::{BuildConfig, Config, ConfigMap};
pub use content::{Action, Collections, ContentItem, ContentStore, ContentType, DEFAULT_LAYOUT};
pub use error::{CoreError, Result};
pub use frontmatter::Frontmatter;
