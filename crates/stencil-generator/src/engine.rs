//! Template engine setup.
//!
//! Wraps a Handlebars registry with the built-in helpers registered up front.
//! Partials are added explicitly by the caller; there is no global registry.

use chrono::{DateTime, Utc};
use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;
use serde_json::Value as Json;

pub use handlebars::{RenderError as EngineRenderError, TemplateError as EngineTemplateError};

handlebars_helper!(date: |value: Json, format: str| format_date(value, format));
handlebars_helper!(limit: |items: array, count: u64| {
    items
        .iter()
        .take(usize::try_from(count).unwrap_or(usize::MAX))
        .cloned()
        .collect::<Vec<_>>()
});

/// Format a Unix timestamp or RFC 3339 string with a chrono format string.
fn format_date(value: &Json, format: &str) -> String {
    match value {
        Json::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| dt.format(format).to_string())
            .unwrap_or_default(),
        Json::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.format(format).to_string())
            .unwrap_or_else(|_| s.clone()),
        _ => String::new(),
    }
}

/// Configured Handlebars instance.
#[derive(Clone)]
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Create an engine with the built-in helpers registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("date", Box::new(date));
        registry.register_helper("limit", Box::new(limit));
        Self { registry }
    }

    /// Register a partial usable as `{{> name}}`.
    pub fn register_partial(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<(), EngineTemplateError> {
        self.registry.register_partial(name, source)
    }

    /// Compile and store a named template.
    pub fn register_template(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<(), EngineTemplateError> {
        self.registry.register_template_string(name, source)
    }

    /// Execute a previously registered template.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, EngineRenderError> {
        self.registry.render(name, data)
    }

    /// Compile and execute a one-off template source.
    pub fn render_source<T: Serialize>(
        &self,
        source: &str,
        data: &T,
    ) -> Result<String, EngineRenderError> {
        self.registry.render_template(source, data)
    }
}
