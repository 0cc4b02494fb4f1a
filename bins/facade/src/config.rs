use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::error::FacadeError;
use crate::retry::RetryPolicy;

#[derive(Parser)]
#[command(name = "facade", about = "Public entry point: submits logs and reads them back")]
pub struct Cli {
    /// Path to TOML config file. Defaults apply when omitted.
    #[arg(long, env = "FACADE_CONFIG")]
    pub config: Option<String>,
}

// ---- TOML Config ----

#[derive(Debug, Clone, Deserialize)]
pub struct FacadeConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_logging_url")]
    pub logging_url: String,
    #[serde(default = "default_messages_url")]
    pub messages_url: String,
    /// Extra attempts after the first failed one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-call timeout towards the logging and messages services.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_listen() -> String {
    "0.0.0.0:13226".to_string()
}
fn default_logging_url() -> String {
    "http://localhost:13228".to_string()
}
fn default_messages_url() -> String {
    "http://localhost:13227".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            logging_url: default_logging_url(),
            messages_url: default_messages_url(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl FacadeConfig {
    pub fn load(path: &str) -> Result<Self, FacadeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FacadeError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        toml::from_str(&content)
            .map_err(|e| FacadeError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    pub fn parse(toml_str: &str) -> Result<Self, FacadeError> {
        toml::from_str(toml_str)
            .map_err(|e| FacadeError::Config { context: "parse", detail: e.to_string() })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
