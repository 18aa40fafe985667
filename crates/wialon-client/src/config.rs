//! Session configuration with YAML support

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WialonError};

/// Default Remote API host
pub const DEFAULT_API_HOST: &str = "http://hst-api.wialon.com";
/// Default Remote API query path
pub const DEFAULT_API_PATH: &str = "/wialon/ajax.html";

/// Connection settings for a [`Session`](crate::Session)
///
/// Can be loaded from YAML, JSON, or constructed programmatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Remote API host including scheme
    #[serde(default = "default_host")]
    pub host: String,

    /// Query path appended to the host
    #[serde(default = "default_path")]
    pub path: String,

    /// Per-call timeout in milliseconds (no timeout when unset)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Directory for request/response dumps (disabled when unset)
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

fn default_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_path() -> String {
    DEFAULT_API_PATH.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            path: default_path(),
            timeout_ms: None,
            dump_dir: None,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| WialonError::Config(e.to_string()))
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WialonError::Config(e.to_string()))
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| WialonError::Config(e.to_string()))
    }

    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Full endpoint URL (`host` + `path`)
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.path)
    }
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = Some(ms);
        self
    }

    pub fn dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dump_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}
