use std::sync::Arc;
use std::time::Duration;

use logging_api::rpc::{AddLogResponse, GetLogsRequest, Log, LogsString};
use logging_api::MapStore;

use crate::admission::AdmissionController;
use crate::aggregator::Aggregator;
use crate::error::LoggingError;

/// Per-request limits.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// Upper bound on waiting for the store within one call.
    pub request_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(crate::config::DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Both RPC operations over one shared store handle.
///
/// Holds no mutable state of its own; every call is an independent unit of
/// work against the store, so one instance serves all concurrent requests.
pub struct LoggingService {
    admission: AdmissionController,
    aggregator: Aggregator,
    options: ServiceOptions,
}

impl LoggingService {
    pub fn new(store: Arc<dyn MapStore>, options: ServiceOptions) -> Self {
        Self {
            admission: AdmissionController::new(store.clone()),
            aggregator: Aggregator::new(store),
            options,
        }
    }

    /// AddLog.
    pub async fn add_log(&self, log: Log) -> Result<AddLogResponse, LoggingError> {
        tracing::info!(identifier = %log.identifier, "Got a request to add log");

        match tokio::time::timeout(self.options.request_timeout, self.admission.admit(&log)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    identifier = %log.identifier,
                    timeout = ?self.options.request_timeout,
                    "admission timed out, outcome unknown"
                );
                return Err(LoggingError::Indeterminate(log.identifier));
            }
        }

        Ok(AddLogResponse { success: true })
    }

    /// GetLogs.
    pub async fn get_logs(&self, _request: GetLogsRequest) -> Result<LogsString, LoggingError> {
        tracing::info!("Got a request to get logs");

        let logs_string = tokio::time::timeout(self.options.request_timeout, self.aggregator.aggregate())
            .await
            .map_err(|_| LoggingError::TimedOut(self.options.request_timeout))??;

        tracing::info!(bytes = logs_string.len(), "aggregated logs");
        Ok(LogsString { logs_string })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::Value;

    use super::*;
    use crate::error::ErrorClass;
    use crate::test_support::{DetachedWriteStore, SlowStore, memory_store};

    fn service(store: Arc<dyn MapStore>) -> LoggingService {
        LoggingService::new(store, ServiceOptions::default())
    }

    #[tokio::test]
    async fn add_then_duplicate() {
        let svc = service(memory_store());

        let ok = svc.add_log(Log::new("u1", "boot ok")).await.unwrap();
        assert!(ok.success);

        let err = svc.add_log(Log::new("u1", "boot fail")).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Conflict);

        let logs = svc.get_logs(GetLogsRequest::default()).await.unwrap();
        assert_eq!(logs.logs_string, "boot ok");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_admissions_of_one_identifier() {
        const CALLERS: usize = 16;
        let store = memory_store();
        let svc = Arc::new(service(store.clone()));

        let calls = (0..CALLERS).map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                let message = format!("payload-{i}");
                svc.add_log(Log::new("shared", message.clone()))
                    .await
                    .map(|_| message)
            })
        });
        let results: Vec<_> = futures::future::join_all(calls)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let winners: Vec<&String> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(err, LoggingError::AlreadyExists(_)));
        }

        let stored = store.get("shared").await.unwrap().unwrap();
        assert_eq!(stored.get("message").and_then(Value::as_str), Some(winners[0].as_str()));
    }

    #[tokio::test]
    async fn distinct_identifiers_all_aggregate() {
        let svc = service(memory_store());
        for i in 0..10 {
            svc.add_log(Log::new(format!("id-{i}"), format!("m{i}"))).await.unwrap();
        }

        let logs = svc.get_logs(GetLogsRequest::default()).await.unwrap();

        let got: HashSet<String> = logs.logs_string.split('\n').map(str::to_string).collect();
        let want: HashSet<String> = (0..10).map(|i| format!("m{i}")).collect();
        assert_eq!(got, want);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_admission_is_indeterminate_and_writes_nothing() {
        let inner = memory_store();
        let slow = Arc::new(SlowStore {
            inner: inner.clone(),
            delay: Duration::from_secs(10),
        });
        let svc = LoggingService::new(
            slow,
            ServiceOptions {
                request_timeout: Duration::from_secs(1),
            },
        );

        let err = svc.add_log(Log::new("u1", "late")).await.unwrap_err();

        assert!(matches!(err, LoggingError::Indeterminate(ref id) if id == "u1"));
        assert_eq!(err.class(), ErrorClass::Internal);

        // The abandoned call never reaches the store, even once its delay is over.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!inner.exists("u1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_aggregation_times_out() {
        let slow = Arc::new(SlowStore {
            inner: memory_store(),
            delay: Duration::from_secs(10),
        });
        let svc = LoggingService::new(
            slow,
            ServiceOptions {
                request_timeout: Duration::from_secs(1),
            },
        );

        let err = svc.get_logs(GetLogsRequest::default()).await.unwrap_err();

        assert!(matches!(err, LoggingError::TimedOut(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_timeout_reports_existing() {
        let inner = memory_store();
        let lagging = Arc::new(DetachedWriteStore {
            inner: inner.clone(),
            delay: Duration::from_secs(3),
        });
        let options = ServiceOptions {
            request_timeout: Duration::from_secs(1),
        };
        let svc = LoggingService::new(lagging, options);

        let err = svc.add_log(Log::new("u1", "first")).await.unwrap_err();
        assert!(matches!(err, LoggingError::Indeterminate(_)));
        assert!(!inner.exists("u1").await.unwrap());

        // The write lands after the caller gave up.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(inner.exists("u1").await.unwrap());

        let retry = LoggingService::new(inner.clone(), options);
        let err = retry.add_log(Log::new("u1", "first")).await.unwrap_err();
        assert!(matches!(err, LoggingError::AlreadyExists(ref id) if id == "u1"));
        assert_eq!(
            retry.get_logs(GetLogsRequest::default()).await.unwrap().logs_string,
            "first"
        );
    }
}
