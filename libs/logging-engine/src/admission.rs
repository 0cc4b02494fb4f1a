use std::sync::Arc;

use logging_api::{LogRecord, MapStore};

use crate::error::LoggingError;

/// Admits new records, at most one per identifier.
///
/// Admission is a single `insert_if_absent` against the shared map: the
/// store decides atomically whether the identifier is new, so concurrent
/// submissions of one identifier cannot both succeed.
pub struct AdmissionController {
    store: Arc<dyn MapStore>,
}

impl AdmissionController {
    pub fn new(store: Arc<dyn MapStore>) -> Self {
        Self { store }
    }

    pub async fn admit(&self, record: &LogRecord) -> Result<(), LoggingError> {
        if record.identifier.is_empty() {
            return Err(LoggingError::InvalidIdentifier);
        }
        if record.message.is_empty() {
            return Err(LoggingError::InvalidRecord(record.identifier.clone()));
        }

        let inserted = self
            .store
            .insert_if_absent(&record.identifier, record.to_value())
            .await
            .map_err(|e| e.with_context(format!("admit '{}'", record.identifier)))?;

        if !inserted {
            tracing::info!(identifier = %record.identifier, "log already exists");
            return Err(LoggingError::AlreadyExists(record.identifier.clone()));
        }

        tracing::debug!(identifier = %record.identifier, "log admitted");
        Ok(())
    }
}
