//! Configuration for the demo server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is read first by the binary.

use serde::{Deserialize, Serialize};
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to (`FORMS_HOST`, default `127.0.0.1`)
    pub host: String,
    /// Port to bind to (`FORMS_PORT`, default `3000`)
    pub port: u16,
    /// Tracing filter used when `RUST_LOG` is unset (`FORMS_LOG_LEVEL`,
    /// default `info`)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("FORMS_HOST").unwrap_or(defaults.host),
            port: lookup("FORMS_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("FORMS_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// `host:port` to bind the listener to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
