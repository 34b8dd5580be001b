mod cli;
mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::Config;
use std::fs;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unqch::{ExtractOptions, SqliteArchive};

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let options = resolve_options(&cli, &config)?;

    if output_exists(&options.output) {
        bail!("file exists: {}", options.output.display());
    }

    tracing::debug!(path = %cli.file.display(), "opening archive read-only");
    let archive = SqliteArchive::open(&cli.file)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;

    let stats = unqch::run(&archive, &options).with_context(|| {
        format!(
            "Failed to extract {} to {}",
            cli.file.display(),
            options.output.display()
        )
    })?;

    println!("Extracted to {}: {}", options.output.display(), stats);
    Ok(())
}

/// Install the stderr subscriber; `RUST_LOG` overrides the verbosity flag
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "unqch=debug"
    } else {
        "unqch=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// True if anything, including a dangling symlink, occupies `path`
fn output_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Build run options from arguments, falling back to config values
fn resolve_options(cli: &Cli, config: &Config) -> Result<ExtractOptions> {
    let output = match &cli.output {
        Some(output) => output.clone(),
        None => {
            let base = match config.get_output_root() {
                Some(root) => root.to_path_buf(),
                None => std::env::current_dir().context("Could not determine current directory")?,
            };
            unqch::default_output(&cli.file, &base)
        }
    };

    let mut options = ExtractOptions::new(output);
    if let Some(toc_name) = config.get_toc_name() {
        options = options.with_toc_name(toc_name);
    }

    Ok(options)
}
