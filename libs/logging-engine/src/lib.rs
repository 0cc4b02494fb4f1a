//! Admission and aggregation of log records over a shared distributed map.

pub mod admission;
pub mod aggregator;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use admission::AdmissionController;
pub use aggregator::Aggregator;
pub use bootstrap::StoreHandle;
pub use config::{LoggingConfig, StoreConfig};
pub use error::{ErrorClass, LoggingError};
pub use service::{LoggingService, ServiceOptions};
