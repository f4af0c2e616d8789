//! Connection coordinates for a Sensu API server.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_PORT: u16 = 8080;

/// Host, port and TLS settings of a Sensu backend API.
///
/// Immutable once built; clone it to share between clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub use_tls: bool,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub ignore_cert: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            use_tls: false,
            ignore_cert: false,
        }
    }

    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    pub fn with_tls(self, use_tls: bool) -> Self {
        Self { use_tls, ..self }
    }

    pub fn with_ignore_cert(self, ignore_cert: bool) -> Self {
        Self {
            ignore_cert,
            ..self
        }
    }

    /// `http(s)://{host}:{port}`
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Absolute URL for an API path such as `/auth`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// Build an endpoint from `SENSU_HOST`, `SENSU_PORT`, `SENSU_USE_TLS` and
    /// `SENSU_IGNORE_CERT`. Only the host is required.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let host = lookup("SENSU_HOST")
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidConfig("SENSU_HOST is not set".to_string()))?;

        let port = match lookup("SENSU_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ApiError::InvalidConfig(format!("SENSU_PORT={raw}: {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            use_tls: parse_flag("SENSU_USE_TLS", lookup("SENSU_USE_TLS"))?,
            ignore_cert: parse_flag("SENSU_IGNORE_CERT", lookup("SENSU_IGNORE_CERT"))?,
        })
    }
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool, ApiError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ApiError::InvalidConfig(format!(
            "{key}={raw}: expected a boolean"
        ))),
    }
}
