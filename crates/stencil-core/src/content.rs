//! Content types and structures.

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    frontmatter::Frontmatter,
};

/// Layout used when a document does not name one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Collection name to ordered content titles.
pub type Collections = BTreeMap<String, Vec<String>>;

/// How a content item is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Copy the source file verbatim.
    Copy,
    /// Render the document through its layout chain.
    Render,
    /// Accepted but produces no output.
    Ignore,
}

/// Type of a renderable document, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Markdown content (.md files), converted to HTML after templating.
    Markdown,
    /// HTML or Handlebars content, emitted as-is after templating.
    Html,
}

impl ContentType {
    /// Determine content type from a file extension, with or without the dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" | "hbs" => Some(Self::Html),
            _ => None,
        }
    }
}

/// One source document or asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier, also used as the collection membership key.
    pub title: String,

    /// Processing path.
    pub action: Action,

    /// Raw template source (render items only).
    #[serde(default)]
    pub document: String,

    /// File suffix including the dot, e.g. `.md`.
    #[serde(default)]
    pub extension: String,

    /// Source file.
    #[serde(default)]
    pub file_path: PathBuf,

    /// Output-relative destination (copy items only).
    #[serde(default)]
    pub destination: PathBuf,

    /// Output path; a trailing `/` means "write index.html inside it".
    #[serde(default)]
    pub permalink: String,

    /// Frontmatter metadata.
    #[serde(default)]
    pub variables: Frontmatter,

    /// Publication date.
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// Create a render item from a template document.
    pub fn render(
        title: impl Into<String>,
        document: impl Into<String>,
        extension: impl Into<String>,
        permalink: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            action: Action::Render,
            document: document.into(),
            extension: extension.into(),
            file_path: PathBuf::new(),
            destination: PathBuf::new(),
            permalink: permalink.into(),
            variables: Frontmatter::default(),
            published: None,
        }
    }

    /// Create a copy item for a static asset.
    pub fn copy(
        title: impl Into<String>,
        file_path: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        let file_path = file_path.into();
        let extension = file_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        Self {
            title: title.into(),
            action: Action::Copy,
            document: String::new(),
            extension,
            file_path,
            destination: destination.into(),
            permalink: String::new(),
            variables: Frontmatter::default(),
            published: None,
        }
    }

    /// Set the frontmatter variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Frontmatter) -> Self {
        self.variables = variables;
        self
    }

    /// Set the source path.
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = path.into();
        self
    }

    /// Set the publication date.
    #[must_use]
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// Layout to render into, falling back to [`DEFAULT_LAYOUT`].
    pub fn layout(&self) -> &str {
        self.variables
            .layout
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_LAYOUT)
    }

    /// Content type of the document, if its extension is a renderable one.
    pub fn content_type(&self) -> Option<ContentType> {
        ContentType::from_extension(&self.extension)
    }

    /// Whether rendered output is converted from Markdown.
    pub fn is_markdown(&self) -> bool {
        self.content_type() == Some(ContentType::Markdown)
    }
}

/// Parsed content items in insertion order, addressable by title.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    items: Vec<ContentItem>,
    index: HashMap<String, usize>,
    collections: Collections,
}

impl ContentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, rejecting duplicate titles.
    pub fn insert(&mut self, item: ContentItem) -> Result<()> {
        if self.index.contains_key(&item.title) {
            return Err(CoreError::duplicate_title(&item.title, &item.file_path));
        }
        self.index.insert(item.title.clone(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Look up an item by title.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&ContentItem> {
        self.index.get(title).map(|&i| &self.items[i])
    }

    /// All items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Named collections of titles.
    #[must_use]
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// Replace a collection. Order is kept as given.
    pub fn set_collection(&mut self, name: impl Into<String>, titles: Vec<String>) {
        self.collections.insert(name.into(), titles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(ContentType::from_extension(".md"), Some(ContentType::Markdown));
        assert_eq!(ContentType::from_extension("markdown"), Some(ContentType::Markdown));
        assert_eq!(ContentType::from_extension(".HTML"), Some(ContentType::Html));
        assert_eq!(ContentType::from_extension(".hbs"), Some(ContentType::Html));
        assert_eq!(ContentType::from_extension(".css"), None);
    }

    #[test]
    fn test_layout_defaults() {
        let mut item = ContentItem::render("Intro", "Hello", ".html", "/intro/");
        assert_eq!(item.layout(), DEFAULT_LAYOUT);

        item.variables.layout = Some(String::new());
        assert_eq!(item.layout(), DEFAULT_LAYOUT);

        item.variables.layout = Some("post".to_string());
        assert_eq!(item.layout(), "post");
    }

    #[test]
    fn test_copy_item_extension() {
        let item = ContentItem::copy("style", "content/css/style.css", "css/style.css");
        assert_eq!(item.action, Action::Copy);
        assert_eq!(item.extension, ".css");
        assert!(!item.is_markdown());
    }

    #[test]
    fn test_store_preserves_order_and_rejects_duplicates() {
        let mut store = ContentStore::new();
        store
            .insert(ContentItem::render("b", "", ".md", "/b/"))
            .unwrap();
        store
            .insert(ContentItem::render("a", "", ".md", "/a/"))
            .unwrap();

        let titles: Vec<_> = store.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(store.get("a").unwrap().permalink, "/a/");

        let err = store
            .insert(ContentItem::render("a", "", ".md", "/other/"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTitle { .. }));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let item = ContentItem::render("Intro", "Hello", ".html", "/intro/");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["action"], "render");
        assert_eq!(value["title"], "Intro");
    }
}
