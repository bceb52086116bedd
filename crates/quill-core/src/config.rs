//! Engine configuration.
//!
//! Holds the remote endpoint and per-request credentials consumed by the
//! HTTP client. Secret credentials are supplied by the caller at runtime;
//! this crate never persists them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Default note color applied when the caller does not pick one.
pub const DEFAULT_NOTE_COLOR: &str = "#CCFFCC";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Basic-auth credentials sent with authenticated API requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Runtime configuration for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remote API base URL, e.g. `https://notes.example.com`.
    pub server_url: String,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
    /// Color assigned to notes created without an explicit one.
    pub default_note_color: String,
}

impl EngineConfig {
    /// Build a configuration from a raw server URL.
    ///
    /// The URL is trimmed and must carry an http(s) scheme; a trailing
    /// slash is stripped so endpoint paths can be appended directly.
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        let server_url = normalize_text_option(Some(server_url.into()))
            .ok_or_else(|| Error::InvalidInput("server URL must not be empty".to_string()))?;
        if !is_http_url(&server_url) {
            return Err(Error::InvalidInput(
                "server URL must include http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            default_note_color: DEFAULT_NOTE_COLOR.to_string(),
        })
    }

    /// Override the HTTP timeout.
    #[must_use]
    pub const fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}
