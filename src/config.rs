//! Client configuration.
//!
//! Layered the same way on every platform: explicit overrides from the
//! embedding application, then an optional `config.toml`, then built-in
//! defaults. The `FLOWDECK_API_URL` environment variable wins over the file
//! for the backend URL so a dev build can be pointed at a staging backend
//! without touching config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_USERNAME: &str = "test";
const DEFAULT_PASSWORD: &str = "test";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Resolved client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API base URL including the `/api` prefix
    /// (FLOWDECK_API_URL env var, default: http://127.0.0.1:8080/api).
    pub api_base_url: String,
    /// Credentials for the lazy login performed by the auth gate.
    pub username: String,
    pub password: String,
    /// Per-request timeout in seconds. A timeout surfaces as a network error.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Optional `config.toml` layer — every field optional.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    api_base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load config from an optional TOML file.
    ///
    /// A missing file is not an error (defaults apply); a present but
    /// unparsable file is.
    pub fn load(path: &Path) -> Result<Self> {
        let toml = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<TomlConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TomlConfig::default(),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        Ok(Self::from_toml(toml))
    }

    fn from_toml(toml: TomlConfig) -> Self {
        let api_base_url = std::env::var("FLOWDECK_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let username = toml.username.unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        let password = toml.password.unwrap_or_else(|| DEFAULT_PASSWORD.to_string());
        let request_timeout_secs = match toml.request_timeout_secs {
            Some(0) => {
                warn!("request_timeout_secs = 0 is not supported — using default");
                DEFAULT_REQUEST_TIMEOUT_SECS
            }
            Some(secs) => secs,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Self {
            api_base_url,
            username,
            password,
            request_timeout_secs,
        }
    }

    /// Config pointed at an arbitrary base URL — used by tests and embedders
    /// that resolve the backend address themselves.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }
}
