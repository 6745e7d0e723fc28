//! Layout registry and chain resolution.
//!
//! A layout wraps already-rendered content (exposed as `{{{content}}}`) and may
//! name a parent layout in its own frontmatter. Resolution walks the chain from
//! the innermost layout out to the first one with no parent.
//!
//! Layout chains are expected to be acyclic. A chain that loops back on itself
//! is reported as [`LayoutError::Cycle`] rather than followed.

use std::{collections::HashMap, path::Path};

use serde::Serialize;
use stencil_core::{ContentItem, frontmatter::parse_frontmatter};
use thiserror::Error;
use tracing::trace;

use crate::{
    engine::{EngineRenderError, EngineTemplateError, TemplateEngine},
    variables::{PageVariables, SiteMap},
};

/// Layout errors.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// No layout registered under this name.
    #[error("unknown layout: {name}")]
    Unknown { name: String },

    /// The parent chain loops back on itself.
    #[error("layout cycle: {chain}")]
    Cycle { chain: String },

    /// Layout source failed to compile.
    #[error("failed to compile layout '{name}': {source}")]
    Compile {
        name: String,
        #[source]
        source: EngineTemplateError,
    },

    /// Layout template failed while executing.
    #[error("failed to render layout '{name}': {source}")]
    Execute {
        name: String,
        #[source]
        source: EngineRenderError,
    },

    /// Layout frontmatter could not be parsed.
    #[error(transparent)]
    Frontmatter(#[from] stencil_core::CoreError),
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// A compiled layout and its declared parent.
#[derive(Debug, Clone)]
pub struct Layout {
    name: String,
    parent: Option<String>,
    template_key: String,
}

impl Layout {
    /// Layout name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent layout, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// Values a layout template sees.
#[derive(Serialize)]
struct LayoutContext<'a> {
    content: &'a str,
    site: &'a SiteMap,
    page: &'a ContentItem,
}

/// Named layouts compiled into one template engine.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    engine: TemplateEngine,
    layouts: HashMap<String, Layout>,
}

impl LayoutRegistry {
    /// Create a registry around a configured engine.
    #[must_use]
    pub fn new(engine: TemplateEngine) -> Self {
        Self {
            engine,
            layouts: HashMap::new(),
        }
    }

    /// The engine layouts are compiled into.
    #[must_use]
    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Register a layout body with an optional parent.
    ///
    /// An empty parent name is treated as no parent.
    pub fn register(&mut self, name: &str, source: &str, parent: Option<&str>) -> Result<()> {
        let template_key = format!("layouts/{name}");
        self.engine
            .register_template(&template_key, source)
            .map_err(|source| LayoutError::Compile {
                name: name.to_string(),
                source,
            })?;

        let parent = parent.filter(|p| !p.is_empty()).map(str::to_string);
        trace!(layout = name, parent = ?parent, "registered layout");
        self.layouts.insert(
            name.to_string(),
            Layout {
                name: name.to_string(),
                parent,
                template_key,
            },
        );
        Ok(())
    }

    /// Register a layout from raw source whose frontmatter may name a parent `layout`.
    pub fn register_source(&mut self, name: &str, raw: &str, path: &Path) -> Result<()> {
        let (frontmatter, body) = parse_frontmatter(raw, path)?;
        self.register(name, &body, frontmatter.layout.as_deref())
    }

    /// Register a partial with the underlying engine.
    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<()> {
        self.engine
            .register_partial(name, source)
            .map_err(|source| LayoutError::Compile {
                name: name.to_string(),
                source,
            })
    }

    /// Look up a layout by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(name)
    }

    /// Whether a layout with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Registered layout names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.layouts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered layouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Whether no layouts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Layouts from `name` out to the root, innermost first.
    pub fn chain(&self, name: &str) -> Result<Vec<&Layout>> {
        let mut chain: Vec<&Layout> = Vec::new();
        let mut current = name;

        loop {
            if chain.iter().any(|layout| layout.name == current) {
                let mut names: Vec<&str> = chain.iter().map(|l| l.name.as_str()).collect();
                names.push(current);
                return Err(LayoutError::Cycle {
                    chain: names.join(" -> "),
                });
            }

            let layout = self.layouts.get(current).ok_or_else(|| LayoutError::Unknown {
                name: current.to_string(),
            })?;
            chain.push(layout);

            match layout.parent.as_deref() {
                Some(parent) => current = parent,
                None => return Ok(chain),
            }
        }
    }

    /// Check every registered layout resolves to a root without cycles.
    pub fn validate(&self) -> Result<()> {
        for name in self.names() {
            self.chain(name)?;
        }
        Ok(())
    }

    /// Wrap rendered content in `layout_name` and each of its ancestors.
    ///
    /// Each layout sees `content`, `site` and `page`; its output becomes the
    /// `content` of its parent.
    pub fn resolve(
        &self,
        content: String,
        vars: &PageVariables<'_>,
        layout_name: &str,
    ) -> Result<String> {
        let chain = self.chain(layout_name)?;

        chain.into_iter().try_fold(content, |content, layout| {
            let context = LayoutContext {
                content: &content,
                site: vars.site,
                page: vars.page,
            };
            self.engine
                .render(&layout.template_key, &context)
                .map_err(|source| LayoutError::Execute {
                    name: layout.name.clone(),
                    source,
                })
        })
    }
}
