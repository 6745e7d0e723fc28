//! Build command - generates the static site

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use color_eyre::eyre::{Result, WrapErr, bail};
use stencil_generator::{BuildStats, Builder};

use super::load_config;

/// Command-line overrides for a build.
#[derive(Debug, Default, Clone)]
pub struct BuildOptions {
    /// Output directory, replacing `build.output_dir`.
    pub output: Option<PathBuf>,
    /// Include drafts.
    pub drafts: bool,
    /// Remove the output directory first.
    pub clean: bool,
    /// Disable parallel rendering.
    pub sequential: bool,
}

/// Run the build command.
///
/// Fails when the site cannot be loaded, when output cannot be written, or
/// when any item failed to render.
pub fn run(config_path: &Path, options: &BuildOptions) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?options, "Starting build");

    let mut config = load_config(config_path)?;
    if let Some(output) = &options.output {
        config.build.output_dir.clone_from(output);
    }
    config.build.drafts |= options.drafts;
    config.build.clean |= options.clean;

    tracing::debug!(?config, "Loaded configuration");

    let mut builder = Builder::from_config(&config).wrap_err("Failed to load site")?;
    if options.sequential {
        builder = builder.sequential();
    }

    let stats = builder.build().wrap_err("Build failed")?;
    print_stats(&stats, builder.output_dir(), start.elapsed().as_secs_f64());

    if !stats.is_success() {
        bail!("{} item(s) failed to render", stats.failures.len());
    }

    Ok(())
}

fn print_stats(stats: &BuildStats, output: &Path, seconds: f64) {
    println!();
    if stats.is_success() {
        println!("  Build completed successfully!");
    } else {
        println!("  Build completed with errors");
    }
    println!();
    println!("  Rendered:  {}", stats.rendered);
    println!("  Copied:    {}", stats.copied);
    println!("  Skipped:   {}", stats.skipped);
    println!("  Failed:    {}", stats.failures.len());
    println!();
    println!("  Duration:  {seconds:.2}s");
    println!("  Output:    {}", output.display());
    println!();

    if !stats.is_success() {
        println!("  Failures:");
        for failure in &stats.failures {
            println!("  ✗ {} ({}): {}", failure.title, failure.path.display(), failure.error);
        }
        println!();
    }
}
