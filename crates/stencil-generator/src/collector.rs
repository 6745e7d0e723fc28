//! Content and layout collection.
//!
//! Walks the content directory into a [`ContentStore`] and the layouts and
//! partials directories into a [`LayoutRegistry`].

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
};

use stencil_core::{
    Action, ContentItem, ContentStore, ContentType, CoreError, frontmatter::parse_frontmatter,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    engine::TemplateEngine,
    layout::{LayoutError, LayoutRegistry},
};

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error on a specific path.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Frontmatter or duplicate title error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Layout failed to load.
    #[error("layout error in {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: LayoutError,
    },

    /// Path outside the directory being walked.
    #[error("invalid content path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CollectorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Files below `dir`, sorted by name, hidden entries skipped.
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Relative path with `/` separators and without its extension.
fn slash_stem(relative: &Path) -> String {
    let without_ext = relative.with_extension("");
    without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Permalink for a document without an explicit one.
///
/// `index.*` maps to its directory; any other file to a directory named after it:
/// `index.md` → `/`, `docs/index.md` → `/docs/`, `posts/hello.md` → `/posts/hello/`.
pub fn derive_permalink(relative: &Path) -> String {
    let stem = slash_stem(relative);
    let stem = stem
        .strip_suffix("/index")
        .unwrap_or(if stem == "index" { "" } else { &stem });
    if stem.is_empty() {
        "/".to_string()
    } else {
        format!("/{stem}/")
    }
}

/// Newest first, undated items last ordered by title.
fn by_published(a: &ContentItem, b: &ContentItem) -> Ordering {
    match (&b.published, &a.published) {
        (Some(b_date), Some(a_date)) => b_date.cmp(a_date),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.title.cmp(&b.title),
    }
}

/// Content collector that walks the content directory.
#[derive(Debug)]
pub struct ContentCollector {
    content_dir: PathBuf,
    drafts: bool,
}

impl ContentCollector {
    /// Create a new content collector.
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            drafts: false,
        }
    }

    /// Include documents marked `draft: true`.
    #[must_use]
    pub fn with_drafts(mut self, drafts: bool) -> Self {
        self.drafts = drafts;
        self
    }

    /// Collect every file under the content directory.
    ///
    /// Renderable documents (`.md`, `.html`, `.hbs`, ...) become render items,
    /// files whose name starts with `_` are kept as data only, and everything
    /// else is copied verbatim.
    pub fn collect(&self) -> Result<ContentStore> {
        info!(dir = %self.content_dir.display(), "collecting content");

        let mut store = ContentStore::new();
        if !self.content_dir.exists() {
            warn!(dir = %self.content_dir.display(), "content directory does not exist");
            return Ok(store);
        }

        for path in walk_files(&self.content_dir)? {
            let relative = path
                .strip_prefix(&self.content_dir)
                .map_err(|_| CollectorError::InvalidPath(path.clone()))?
                .to_path_buf();

            if let Some(item) = self.collect_file(&path, &relative)? {
                store.insert(item)?;
            }
        }

        self.assemble_collections(&mut store);

        info!(
            items = store.len(),
            collections = store.collections().len(),
            "content collection complete"
        );
        Ok(store)
    }

    /// Turn one file into a content item, or `None` for skipped drafts.
    fn collect_file(&self, path: &Path, relative: &Path) -> Result<Option<ContentItem>> {
        let extension = relative
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        if ContentType::from_extension(&extension).is_none() {
            let destination = slash_path(relative);
            debug!(path = %relative.display(), "collected asset");
            return Ok(Some(ContentItem::copy(destination.clone(), path, destination)));
        }

        let raw = read(path)?;
        let (variables, body) = parse_frontmatter(&raw, path)?;

        if variables.draft && !self.drafts {
            debug!(path = %relative.display(), "skipping draft");
            return Ok(None);
        }

        let data_only = relative
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('_'));

        let title = variables
            .title
            .clone()
            .unwrap_or_else(|| slash_stem(relative));
        let permalink = variables
            .permalink
            .clone()
            .unwrap_or_else(|| derive_permalink(relative));

        let mut item = ContentItem::render(title, body, extension, permalink)
            .with_file_path(path)
            .with_variables(variables);
        item.published = item.variables.date;
        if data_only {
            item.action = Action::Ignore;
        }

        debug!(path = %relative.display(), title = %item.title, "collected document");
        Ok(Some(item))
    }

    /// Group documents by `collections` frontmatter and by section.
    ///
    /// The section is the first directory of a document's path, so
    /// `posts/hello.md` joins `posts`. Data-only files join only the
    /// collections they name.
    fn assemble_collections(&self, store: &mut ContentStore) {
        let mut collections: BTreeMap<String, Vec<&ContentItem>> = BTreeMap::new();

        for item in store.items().iter().filter(|i| i.action != Action::Copy) {
            let relative = item.file_path.strip_prefix(&self.content_dir).ok();
            let section = relative
                .filter(|r| item.action == Action::Render && r.components().count() > 1)
                .and_then(|r| r.components().next())
                .and_then(|c| c.as_os_str().to_str());

            let mut names: Vec<&str> = item
                .variables
                .collections
                .iter()
                .map(String::as_str)
                .collect();
            if let Some(section) = section
                && !names.contains(&section)
            {
                names.push(section);
            }

            for name in names {
                collections.entry(name.to_string()).or_default().push(item);
            }
        }

        let ordered: Vec<(String, Vec<String>)> = collections
            .into_iter()
            .map(|(name, mut items)| {
                items.sort_by(|a, b| by_published(a, b));
                let titles = items.into_iter().map(|i| i.title.clone()).collect();
                (name, titles)
            })
            .collect();

        for (name, titles) in ordered {
            debug!(collection = %name, size = titles.len(), "built collection");
            store.set_collection(name, titles);
        }
    }
}

fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Load layouts and partials into a registry backed by a fresh engine.
///
/// A layout's name is its path under `layouts_dir` without extension
/// (`layouts/blog/post.hbs` → `blog/post`); partials are named the same way.
/// Missing directories are treated as empty.
pub fn load_layouts(layouts_dir: &Path, partials_dir: &Path) -> Result<LayoutRegistry> {
    let mut registry = LayoutRegistry::new(TemplateEngine::new());

    for (dir, kind) in [(partials_dir, "partial"), (layouts_dir, "layout")] {
        if !dir.exists() {
            debug!(dir = %dir.display(), kind, "template directory does not exist");
            continue;
        }

        for path in walk_files(dir)? {
            let is_template = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "hbs" | "html" | "htm"));
            if !is_template {
                continue;
            }

            let relative = path
                .strip_prefix(dir)
                .map_err(|_| CollectorError::InvalidPath(path.clone()))?;
            let name = slash_stem(relative);
            let source = read(&path)?;

            let loaded = if kind == "partial" {
                registry.register_partial(&name, &source)
            } else {
                registry.register_source(&name, &source, &path)
            };
            loaded.map_err(|source| CollectorError::Layout {
                path: path.clone(),
                source,
            })?;
            debug!(name = %name, kind, "loaded template");
        }
    }

    info!(layouts = registry.len(), "layouts loaded");
    Ok(registry)
}
