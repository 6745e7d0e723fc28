//! Site configuration management.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Arbitrary site-wide key/value configuration exposed to templates as `site`.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Main configuration structure for Stencil.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Global site values, passed through to templates untouched.
    #[serde(default)]
    pub site: ConfigMap,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory holding content documents and static assets.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Directory holding layout templates.
    #[serde(default = "default_layouts_dir")]
    pub layouts_dir: PathBuf,

    /// Directory holding partial templates.
    #[serde(default = "default_partials_dir")]
    pub partials_dir: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Whether to render drafts.
    #[serde(default)]
    pub drafts: bool,

    /// Remove the output directory before building.
    #[serde(default)]
    pub clean: bool,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_layouts_dir() -> PathBuf {
    PathBuf::from("layouts")
}

fn default_partials_dir() -> PathBuf {
    PathBuf::from("partials")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("_site")
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            layouts_dir: default_layouts_dir(),
            partials_dir: default_partials_dir(),
            output_dir: default_output_dir(),
            drafts: false,
            clean: false,
        }
    }
}

impl BuildConfig {
    /// Check the directory settings.
    ///
    /// Every directory must be named, and the output directory may neither
    /// contain nor sit inside any input directory.
    pub fn check_dirs(&self) -> Result<()> {
        let inputs = [
            ("build.content_dir", &self.content_dir),
            ("build.layouts_dir", &self.layouts_dir),
            ("build.partials_dir", &self.partials_dir),
        ];

        if self.output_dir.as_os_str().is_empty() {
            return Err(CoreError::config("build.output_dir cannot be empty"));
        }

        let output = normalized(&self.output_dir);
        for (key, dir) in inputs {
            if dir.as_os_str().is_empty() {
                return Err(CoreError::config(format!("{key} cannot be empty")));
            }

            let input = normalized(dir);
            if input.starts_with(&output) || output.starts_with(&input) {
                return Err(CoreError::config(format!(
                    "build.output_dir ({}) must not overlap {key} ({})",
                    self.output_dir.display(),
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}

/// Drop `.` components so `./site` and `site` compare equal.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl Config {
    /// Load configuration from a TOML file, layered with `STENCIL__*`
    /// environment overrides.
    ///
    /// `STENCIL__BUILD__OUTPUT_DIR=dist` overrides `build.output_dir`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix("STENCIL").separator("__"))
            .build()
            .map_err(|e| {
                CoreError::config_with_source(
                    format!("Failed to parse config file: {}", path.display()),
                    e,
                )
            })?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        self.build.check_dirs()?;

        match self.site.get("title") {
            Some(title) if !title.is_string() => {
                return Err(CoreError::config("site.title must be a string"));
            }
            None => tracing::warn!("site.title is not set"),
            Some(_) => {}
        }

        Ok(())
    }

    /// Resolve the configured directories against a project root.
    #[must_use]
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let join = |dir: &PathBuf| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            }
        };
        self.build.content_dir = join(&self.build.content_dir);
        self.build.layouts_dir = join(&self.build.layouts_dir);
        self.build.partials_dir = join(&self.build.partials_dir);
        self.build.output_dir = join(&self.build.output_dir);
        self
    }
}
