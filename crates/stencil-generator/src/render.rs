//! Rendering of individual content items.
//!
//! A document is first executed as a template against `{ site, page }`,
//! converted from Markdown when it is a `.md` file, and then wrapped in its
//! layout chain.

use std::path::PathBuf;

use stencil_core::ContentItem;
use thiserror::Error;
use tracing::debug;

use crate::{
    engine::EngineRenderError,
    layout::{LayoutError, LayoutRegistry},
    markdown::MarkdownRenderer,
    variables::SiteVariables,
};

/// Per-item rendering errors. None of these stop the rest of a build.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document's own template failed to compile or execute.
    #[error("failed to render '{title}' ({path}): {source}")]
    Template {
        title: String,
        path: PathBuf,
        #[source]
        source: EngineRenderError,
    },

    /// The layout chain could not be resolved or executed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl RenderError {
    /// Name of the missing layout, if that is what failed.
    #[must_use]
    pub fn unknown_layout(&self) -> Option<&str> {
        match self {
            Self::Layout(LayoutError::Unknown { name }) => Some(name),
            _ => None,
        }
    }
}

/// Result type for rendering.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Renders content items through the registered layouts.
#[derive(Debug, Clone, Copy)]
pub struct ElementRenderer<'a> {
    layouts: &'a LayoutRegistry,
    markdown: MarkdownRenderer,
}

impl<'a> ElementRenderer<'a> {
    /// Create a renderer over a layout registry.
    #[must_use]
    pub fn new(layouts: &'a LayoutRegistry) -> Self {
        Self {
            layouts,
            markdown: MarkdownRenderer::new(),
        }
    }

    /// Render one item to its final HTML.
    pub fn render(&self, item: &ContentItem, site: &SiteVariables) -> Result<String> {
        let vars = site.for_page(item);

        let body = self
            .layouts
            .engine()
            .render_source(&item.document, &vars)
            .map_err(|source| RenderError::Template {
                title: item.title.clone(),
                path: item.file_path.clone(),
                source,
            })?;

        let body = if item.is_markdown() {
            self.markdown.render(&body)
        } else {
            body
        };

        let layout = item.layout();
        debug!(title = %item.title, layout, "resolving layout chain");

        Ok(self.layouts.resolve(body, &vars, layout)?)
    }
}
