//! Request/response dumping for debugging
//!
//! A [`ResponseSink`] is handed every completed exchange before the response is
//! checked for errors. Sinks are infallible from the session's point of view:
//! they must handle (or log) their own failures.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// One request/response pair
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub method: &'a str,
    pub params: &'a Value,
    /// Query parameters as sent (`svc`, `params`, `sid`)
    pub query: &'a [(&'static str, String)],
    pub response: &'a Value,
}

impl Exchange<'_> {
    pub fn to_json(&self) -> Value {
        let query: Map<String, Value> = self
            .query
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
            .collect();
        json!({
            "request": {
                "method": self.method,
                "params": self.params,
                "query": query
            },
            "response": self.response
        })
    }
}

/// Receiver for request/response pairs
pub trait ResponseSink: Send + Sync {
    fn store(&self, exchange: &Exchange<'_>);
}

/// Writes each exchange to `{method}-{timestamp}-{counter}.json` in a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the exchange, returning the created file path
    pub fn write(&self, exchange: &Exchange<'_>) -> io::Result<PathBuf> {
        let prefix = format!(
            "{}-{}",
            exchange.method.replace('/', "_"),
            chrono::Local::now().format("%Y%m%d%H%M%S")
        );
        let content = serde_json::to_vec_pretty(&exchange.to_json())?;

        let mut counter = 0u32;
        loop {
            let path = self.dir.join(format!("{}-{}.json", prefix, counter));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&content)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

impl ResponseSink for DirectorySink {
    fn store(&self, exchange: &Exchange<'_>) {
        match self.write(exchange) {
            Ok(path) => debug!("API response stored to {}", path.display()),
            Err(e) => warn!(
                method = exchange.method,
                "Failed to store API response in {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}
