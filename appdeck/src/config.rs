//! Workspace configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::AppsError;

/// Environment variable holding the workspace host URL
pub const HOST_ENV: &str = "APPDECK_HOST";

/// Environment variable holding the bearer credential
pub const TOKEN_ENV: &str = "APPDECK_TOKEN";

/// Connection options for one workspace
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    /// Control-plane base URL, e.g. `https://acme.example.com`
    pub host: String,

    /// Opaque bearer credential supplied by the caller
    pub token: SecretString,

    /// TCP connect timeout for raw socket connections
    pub connect_timeout: Duration,
}

impl WorkspaceOptions {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            token: SecretString::from(token.into()),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Build options from `APPDECK_HOST` / `APPDECK_TOKEN`.
    pub fn from_env() -> Result<Self, AppsError> {
        let host = std::env::var(HOST_ENV)
            .map_err(|_| AppsError::Config(format!("{} is not set", HOST_ENV)))?;
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| AppsError::Config(format!("{} is not set", TOKEN_ENV)))?;
        Ok(Self::new(host, token))
    }

    /// Full `Authorization` header value for one handshake or request.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}
