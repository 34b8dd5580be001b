//! Configuration management for unqch CLI

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory that default output directories are created in
    pub output_root: Option<PathBuf>,
    /// Name of the rendered table of contents
    pub toc_name: Option<String>,
}

impl Config {
    /// Get the path to the default config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("unqch");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from `path`, or the default location
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Ok(p) => p,
                Err(_) => return Ok(Config::default()),
            },
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Get the output root, or None if not set
    pub fn get_output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    /// Get the table of contents name, or None if not set
    pub fn get_toc_name(&self) -> Option<&str> {
        self.toc_name.as_deref()
    }
}
