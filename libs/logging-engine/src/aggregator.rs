use std::sync::Arc;

use serde_json::Value;

use logging_api::record::{IDENTIFIER_FIELD, message_of};
use logging_api::MapStore;

use crate::error::LoggingError;

/// Joins the message of every stored record.
///
/// The store keeps no order across keys, so neither does the output.
pub struct Aggregator {
    store: Arc<dyn MapStore>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn MapStore>) -> Self {
        Self { store }
    }

    /// Newline-joined messages. One unreadable record fails the whole call.
    pub async fn aggregate(&self) -> Result<String, LoggingError> {
        let values = self
            .store
            .values()
            .await
            .map_err(|e| e.with_context("enumerate logs"))?;

        let messages = values
            .iter()
            .map(|value| {
                message_of(value).ok_or_else(|| LoggingError::MalformedRecord {
                    identifier: identifier_of(value),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages.join("\n"))
    }
}

fn identifier_of(value: &Value) -> String {
    value
        .get(IDENTIFIER_FIELD)
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string()
}
