//! Configuration data structures for Rotor.
//!
//! These map directly to the JSON configuration file (TOML / YAML are read as
//! well). Everything except `api_configs` has a default, so the minimal file is
//! `{"api_configs": [{"base_url": "...", "api_key": "..."}]}`.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default function for the listen address
fn default_listen_addr() -> String {
    "0.0.0.0:8888".to_string()
}

/// Default display name for endpoints without one
fn default_endpoint_name() -> String {
    "Unnamed".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One upstream API endpoint and the credential used against it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Display label used in logs; not required to be unique
    #[serde(default = "default_endpoint_name")]
    pub name: String,
    /// Absolute URL prefix the request path is appended to
    pub base_url: String,
    /// Credential sent in the `x-goog-api-key` header
    pub api_key: String,
}

// Keys must not end up in logs.
impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Top-level proxy configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Upstream endpoints in rotation order
    #[serde(default)]
    pub api_configs: Vec<EndpointConfig>,
    /// Address the proxy listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upper bound for one upstream exchange; unset means wait indefinitely
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_configs: Vec::new(),
            listen_addr: default_listen_addr(),
            upstream_timeout_secs: None,
            log: LogConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Replace the port of `listen_addr`, keeping its host part.
    pub fn override_port(&mut self, port: u16) {
        let host = match self.listen_addr.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.listen_addr.clone(),
        };
        self.listen_addr = format!("{host}:{port}");
    }
}
