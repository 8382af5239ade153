//! Error types for appdeck

use thiserror::Error;

/// Main error type for appdeck
#[derive(Error, Debug)]
pub enum AppsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Control plane error ({status}): {body}")]
    ControlPlane { status: u16, body: String },

    #[error("WebSocket upgrade failed: {status}")]
    HandshakeFailed { status: String, body: String },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Deploy error: {0}")]
    Deploy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppsError {
    /// Whether this error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppsError::NotFound(_))
    }
}

impl From<anyhow::Error> for AppsError {
    fn from(err: anyhow::Error) -> Self {
        AppsError::Config(err.to_string())
    }
}
