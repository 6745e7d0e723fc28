//! Stencil CLI
//!
//! Static site generator built on nested Handlebars layouts.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Stencil.
#[derive(Parser)]
#[command(
    name = "stencil",
    version,
    about = "A static site generator built on nested Handlebars layouts"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stencil.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site
    Build {
        /// Output directory (overrides build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include draft content
        #[arg(long)]
        drafts: bool,
        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,
        /// Render items one at a time
        #[arg(long)]
        sequential: bool,
    },
    /// Validate configuration, content and layouts
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    stencil::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            drafts,
            clean,
            sequential,
        } => {
            let options = stencil::cmd::build::BuildOptions {
                output,
                drafts,
                clean,
                sequential,
            };
            stencil::cmd::build::run(&cli.config, &options)?;
        }
        Commands::Check { strict } => {
            stencil::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}
