//! Error types for Wialon client operations

use std::fmt;

use thiserror::Error;

use crate::areas::AreaType;
use crate::codes::{ErrorCode, ErrorKind};

/// Result type alias for Wialon client operations
pub type Result<T> = std::result::Result<T, WialonError>;

/// Error reported by the server through the `error` field of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: i64,
    /// Server-supplied reason (optional in the protocol)
    pub reason: Option<String>,
    pub description: &'static str,
    /// Session identifier active when the error was observed
    pub sid: Option<String>,
}

impl ApiError {
    /// Classify a server error code
    pub fn classify(code: i64, reason: Option<String>, sid: Option<String>) -> Self {
        let catalogued = ErrorCode::from(code);
        Self {
            kind: catalogued.kind(),
            code,
            reason: reason.filter(|r| !r.is_empty()),
            description: catalogued.description(),
            sid,
        }
    }

    /// `description` or `description: reason`
    pub fn message(&self) -> String {
        match &self.reason {
            Some(reason) => format!("{}: {}", self.description, reason),
            None => self.description.to_string(),
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ApiError {}

/// Errors that can occur during Wialon client operations
#[derive(Error, Debug)]
pub enum WialonError {
    /// Server returned a non-zero error code
    #[error(transparent)]
    Api(#[from] ApiError),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A domain call was attempted without an authenticated session
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// Sensor values do not line up with the loaded messages
    #[error("Sensor data mismatch: {messages} messages, {sensors} sensor entries")]
    SensorDataMismatch { messages: usize, sensors: usize },

    /// Area record carries an unknown type discriminant
    #[error("Unsupported area type: {0}")]
    UnsupportedAreaType(i64),

    /// Point containment is not defined for this area type
    #[error("Point containment is not supported for {0} areas")]
    UnsupportedContainment(AreaType),

    /// Area missing from a detail response
    #[error("Area {area_id} not found in resource {resource_id}")]
    AreaNotFound { resource_id: i64, area_id: i64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WialonError {
    /// Classified server error, if this is one
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Server error code, if this is a classified server error
    pub fn code(&self) -> Option<i64> {
        self.api().map(|err| err.code)
    }

    /// True for code 1 and for calls made without a session
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, Self::NotAuthenticated) || self.code() == Some(1)
    }

    pub fn is_authentication(&self) -> bool {
        self.api()
            .is_some_and(|err| err.kind == ErrorKind::Authentication)
    }

    pub fn is_invalid_input(&self) -> bool {
        self.api().is_some_and(|err| err.kind == ErrorKind::InvalidInput)
    }
}
