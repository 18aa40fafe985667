//! Configuration file handling for wialon-query

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wialon_client::{SessionConfig, DEFAULT_API_HOST, DEFAULT_API_PATH};

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API host
    pub host: Option<String>,
    /// API path
    pub path: Option<String>,
    /// Per-call timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Directory for request/response dumps
    pub dump_dir: Option<PathBuf>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

/// Connection-related CLI arguments
#[derive(Debug, Clone, Default)]
pub struct ArgOverrides<'a> {
    pub host: Option<&'a str>,
    pub path: Option<&'a str>,
    pub timeout_ms: Option<u64>,
    pub dump_dir: Option<&'a Path>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("wialon-query");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: ArgOverrides<'_>, no_color: bool) -> MergedConfig {
        let session = SessionConfig {
            host: args
                .host
                .map(String::from)
                .or_else(|| self.host.clone())
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            path: args
                .path
                .map(String::from)
                .or_else(|| self.path.clone())
                .unwrap_or_else(|| DEFAULT_API_PATH.to_string()),
            timeout_ms: args.timeout_ms.or(self.timeout_ms),
            dump_dir: args
                .dump_dir
                .map(Path::to_path_buf)
                .or_else(|| self.dump_dir.clone()),
        };

        MergedConfig {
            session,
            output: self.output.clone(),
            no_color: no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub session: SessionConfig,
    pub output: Option<String>,
    pub no_color: bool,
}
