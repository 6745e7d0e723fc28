//! Build orchestration.
//!
//! Builds the site variables once, then renders or copies every content item.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use stencil_core::{Action, Config, ConfigMap, ContentItem, ContentStore, CoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    collector::{CollectorError, ContentCollector, load_layouts},
    layout::LayoutRegistry,
    output::{OutputError, OutputWriter},
    render::{ElementRenderer, RenderError},
    variables::{CollectionError, SiteVariables},
};

/// Build errors. Any of these aborts the build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Build settings are unusable.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Two items would be written to the same file.
    #[error("'{first}' and '{second}' both write to {path}")]
    DuplicateOutput {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// Content or layouts failed to load.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Collections reference content that does not exist.
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),

    /// Writing or copying output failed.
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// A content item that could not be rendered.
#[derive(Debug)]
pub struct ItemFailure {
    /// Title of the item.
    pub title: String,

    /// Source file of the item.
    pub path: PathBuf,

    /// What went wrong.
    pub error: RenderError,
}

/// Build statistics.
#[derive(Debug, Default)]
pub struct BuildStats {
    /// Number of pages rendered and written.
    pub rendered: usize,

    /// Number of files copied verbatim.
    pub copied: usize,

    /// Number of items accepted without output.
    pub skipped: usize,

    /// Items whose rendering failed; nothing was written for them.
    pub failures: Vec<ItemFailure>,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildStats {
    /// Whether every item was processed without failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What happened to one item.
enum Outcome {
    Rendered,
    Copied,
    Skipped,
    Failed(ItemFailure),
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    site: ConfigMap,
    store: ContentStore,
    layouts: LayoutRegistry,
    writer: OutputWriter,
    parallel: bool,
    clean: bool,
    timestamp: Option<i64>,
}

impl Builder {
    /// Create a builder from already-loaded inputs.
    #[must_use]
    pub fn new(
        site: ConfigMap,
        store: ContentStore,
        layouts: LayoutRegistry,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            site,
            store,
            layouts,
            writer: OutputWriter::new(output_dir),
            parallel: true,
            clean: false,
            timestamp: None,
        }
    }

    /// Load content and layouts from the directories named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.build.check_dirs()?;

        let store = ContentCollector::new(&config.build.content_dir)
            .with_drafts(config.build.drafts)
            .collect()?;
        let layouts = load_layouts(&config.build.layouts_dir, &config.build.partials_dir)?;

        Ok(Self::new(
            config.site.clone(),
            store,
            layouts,
            &config.build.output_dir,
        )
        .with_clean(config.build.clean))
    }

    /// Process items one at a time instead of in parallel.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Remove the output directory before writing.
    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Use a fixed `site.now` instead of the current time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Loaded content.
    #[must_use]
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Loaded layouts.
    #[must_use]
    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.writer.root()
    }

    /// Execute the full build.
    ///
    /// Per-item render failures are collected in [`BuildStats::failures`] and
    /// do not stop the build. Collection errors and clashing output paths are
    /// detected before anything is written. I/O errors abort the build; files
    /// written before the error stay in place.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();

        info!(
            output = %self.writer.root().display(),
            items = self.store.len(),
            layouts = self.layouts.len(),
            parallel = self.parallel,
            "starting build"
        );

        self.check_targets()?;

        let mut vars = match self.timestamp {
            Some(ts) => SiteVariables::new(&self.site, ts),
            None => SiteVariables::at_now(&self.site),
        };
        vars.assemble_collections(&self.store)?;
        let vars = vars;

        if self.clean {
            self.writer.clean()?;
        }

        let renderer = ElementRenderer::new(&self.layouts);
        let process = |item: &ContentItem| self.process(item, &renderer, &vars);
        let items = self.store.items();

        let outcomes: Vec<Outcome> = if self.parallel {
            items.par_iter().map(process).collect::<Result<_>>()?
        } else {
            items.iter().map(process).collect::<Result<_>>()?
        };

        let mut stats = BuildStats::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Rendered => stats.rendered += 1,
                Outcome::Copied => stats.copied += 1,
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Failed(failure) => stats.failures.push(failure),
            }
        }
        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            rendered = stats.rendered,
            copied = stats.copied,
            skipped = stats.skipped,
            failed = stats.failures.len(),
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Every item that produces output must own its output file.
    fn check_targets(&self) -> Result<()> {
        let mut owners: HashMap<PathBuf, &str> = HashMap::new();
        for item in self.store.items() {
            let Some(path) = self.writer.target(item)? else {
                continue;
            };
            if let Some(first) = owners.insert(path.clone(), &item.title) {
                return Err(BuildError::DuplicateOutput {
                    path,
                    first: first.to_string(),
                    second: item.title.clone(),
                });
            }
        }
        Ok(())
    }

    /// Dispatch one item on its action.
    fn process(
        &self,
        item: &ContentItem,
        renderer: &ElementRenderer<'_>,
        vars: &SiteVariables,
    ) -> Result<Outcome> {
        match item.action {
            Action::Copy => {
                self.writer.copy(item)?;
                Ok(Outcome::Copied)
            }
            Action::Render => match renderer.render(item, vars) {
                Ok(html) => {
                    self.writer.write(&html, &item.permalink)?;
                    Ok(Outcome::Rendered)
                }
                Err(error) => {
                    warn!(
                        title = %item.title,
                        path = %item.file_path.display(),
                        error = %error,
                        "failed to render item"
                    );
                    Ok(Outcome::Failed(ItemFailure {
                        title: item.title.clone(),
                        path: item.file_path.clone(),
                        error,
                    }))
                }
            },
            Action::Ignore => {
                debug!(title = %item.title, "no output for item");
                Ok(Outcome::Skipped)
            }
        }
    }
}
