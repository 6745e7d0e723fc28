//! Command implementations.

pub mod build;
pub mod check;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use stencil_core::Config;

/// Load the configuration with environment overrides, with its directories
/// resolved relative to the file's own location.
pub fn load_config(config_path: &Path) -> Result<Config> {
    let config = Config::load(config_path)
        .wrap_err_with(|| format!("Failed to load configuration {}", config_path.display()))?;
    let root = config_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.rooted_at(root))
}
