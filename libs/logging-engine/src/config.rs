use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::LoggingError;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:13228";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Root configuration, parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// RPC listen address.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upper bound on one request's wait for the store.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Distributed map store client settings.
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// `[store]` table. `backend` picks the client, the remaining keys are
/// handed to it unparsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(flatten)]
    pub settings: toml::Table,
}

fn default_backend() -> String {
    "memory".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            settings: toml::Table::new(),
        }
    }
}

impl StoreConfig {
    /// Deserialize the backend-specific keys.
    pub fn settings<T: serde::de::DeserializeOwned>(&self) -> Result<T, LoggingError> {
        toml::Value::Table(self.settings.clone())
            .try_into()
            .map_err(|e| LoggingError::Config(format!("store '{}': {e}", self.backend)))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_ms: default_request_timeout_ms(),
            store: StoreConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, LoggingError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoggingError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, LoggingError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| LoggingError::Config(e.to_string()))?;
        config.listen_addr()?;
        if config.request_timeout_ms == 0 {
            return Err(LoggingError::Config("request_timeout_ms must be positive".into()));
        }
        Ok(config)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, LoggingError> {
        self.listen
            .parse()
            .map_err(|e| LoggingError::Config(format!("listen '{}': {e}", self.listen)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
