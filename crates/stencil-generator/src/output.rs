//! Writing rendered pages and copied assets to the output directory.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use stencil_core::{Action, ContentItem};
use thiserror::Error;
use tracing::debug;

/// File written for directory-style permalinks.
pub const INDEX_FILE: &str = "index.html";

/// Output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error on a specific path.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination would escape the output root.
    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes files beneath an output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    /// Create a writer rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination file for a permalink.
    ///
    /// A permalink ending in `/` (or empty) maps to `index.html` inside it.
    pub fn permalink_path(&self, permalink: &str) -> Result<PathBuf> {
        let relative = self.checked_relative(permalink)?;
        let mut dest = self.root.join(relative);
        if permalink.is_empty() || permalink.ends_with('/') {
            dest.push(INDEX_FILE);
        }
        Ok(dest)
    }

    /// Destination file for a copy item.
    pub fn destination_path(&self, item: &ContentItem) -> Result<PathBuf> {
        let destination = item.destination.to_string_lossy();
        Ok(self.root.join(self.checked_relative(&destination)?))
    }

    /// File an item will be written to, or `None` if it produces no output.
    pub fn target(&self, item: &ContentItem) -> Result<Option<PathBuf>> {
        match item.action {
            Action::Copy => self.destination_path(item).map(Some),
            Action::Render => self.permalink_path(&item.permalink).map(Some),
            Action::Ignore => Ok(None),
        }
    }

    /// Copy an item's source file verbatim to its destination.
    pub fn copy(&self, item: &ContentItem) -> Result<PathBuf> {
        let dest = self.destination_path(item)?;
        ensure_parent(&dest)?;
        fs::copy(&item.file_path, &dest).map_err(io_error(&item.file_path))?;
        debug!(from = %item.file_path.display(), to = %dest.display(), "copied file");
        Ok(dest)
    }

    /// Write rendered content at a permalink, replacing any existing file.
    pub fn write(&self, content: &str, permalink: &str) -> Result<PathBuf> {
        let dest = self.permalink_path(permalink)?;
        ensure_parent(&dest)?;
        fs::write(&dest, content).map_err(io_error(&dest))?;
        debug!(path = %dest.display(), "wrote page");
        Ok(dest)
    }

    /// Remove and recreate the output root.
    pub fn clean(&self) -> Result<()> {
        if self.root.exists() {
            debug!(dir = %self.root.display(), "cleaning output directory");
            fs::remove_dir_all(&self.root).map_err(io_error(&self.root))?;
        }
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))
    }

    /// Strip leading separators and reject anything that climbs out of the root.
    fn checked_relative<'p>(&self, path: &'p str) -> Result<&'p Path> {
        let relative = Path::new(path.trim_start_matches(['/', '\\']));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(OutputError::InvalidPath(path.to_string()));
        }
        Ok(relative)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_permalink_paths() {
        let writer = OutputWriter::new("/out");
        assert_eq!(
            writer.permalink_path("/intro/").unwrap(),
            PathBuf::from("/out/intro/index.html")
        );
        assert_eq!(
            writer.permalink_path("feed.xml").unwrap(),
            PathBuf::from("/out/feed.xml")
        );
        assert_eq!(
            writer.permalink_path("/").unwrap(),
            PathBuf::from("/out/index.html")
        );
        assert_eq!(
            writer.permalink_path("").unwrap(),
            PathBuf::from("/out/index.html")
        );
    }

    #[test]
    fn test_parent_dir_rejected() {
        let writer = OutputWriter::new("/out");
        assert!(matches!(
            writer.permalink_path("/../etc/passwd"),
            Err(OutputError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_write_creates_dirs_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());

        let path = writer.write("first", "/a/b/c/").unwrap();
        assert_eq!(path, dir.path().join("a/b/c/index.html"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        writer.write("second", "/a/b/c/").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_exact_path() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());

        let path = writer.write("<rss/>", "/feeds/rss.xml").unwrap();
        assert_eq!(path, dir.path().join("feeds/rss.xml"));
        assert!(!dir.path().join("feeds/rss.xml/index.html").exists());
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let bytes: Vec<u8> = (0..=255).collect();
        let source = src.path().join("logo.png");
        fs::write(&source, &bytes).unwrap();

        let writer = OutputWriter::new(out.path());
        let item = ContentItem::copy("img/logo.png", &source, "img/logo.png");
        let dest = writer.copy(&item).unwrap();

        assert_eq!(dest, out.path().join("img/logo.png"));
        assert_eq!(fs::read(dest).unwrap(), bytes);
    }

    #[test]
    fn test_copy_missing_source_names_path() {
        let out = TempDir::new().unwrap();
        let writer = OutputWriter::new(out.path());
        let item = ContentItem::copy("ghost", "/nonexistent/ghost.css", "ghost.css");

        let err = writer.copy(&item).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ghost.css"));
    }

    #[test]
    fn test_targets() {
        let writer = OutputWriter::new("/out");
        let page = ContentItem::render("Intro", "x", ".html", "/intro/");
        let asset = ContentItem::copy("css/site.css", "/src/css/site.css", "css/site.css");
        let mut data = ContentItem::render("Data", "x", ".md", "/data/");
        data.action = Action::Ignore;

        assert_eq!(
            writer.target(&page).unwrap(),
            Some(PathBuf::from("/out/intro/index.html"))
        );
        assert_eq!(
            writer.target(&asset).unwrap(),
            Some(PathBuf::from("/out/css/site.css"))
        );
        assert_eq!(writer.target(&data).unwrap(), None);
    }

    #[test]
    fn test_clean() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        let writer = OutputWriter::new(&root);
        writer.write("stale", "old.html").unwrap();

        writer.clean().unwrap();
        assert!(root.exists());
        assert!(!root.join("old.html").exists());
    }
}
