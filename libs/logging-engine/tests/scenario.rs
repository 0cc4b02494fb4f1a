//! End-to-end behavior of the logging core over the memory cluster.

use std::sync::Arc;

use logging_api::rpc::{GetLogsRequest, Log};
use logging_api::MapStore;
use logging_engine::{ErrorClass, LoggingConfig, LoggingService, ServiceOptions, StoreHandle};
use storage_memory::MemoryCluster;

#[tokio::test]
async fn duplicate_submission_keeps_first_message() {
    let config = LoggingConfig::parse("[store]\ncluster = \"scenario-duplicate\"").unwrap();
    let handle = StoreHandle::open(&config.store, 1).await.unwrap();
    let service = LoggingService::new(handle.store(), ServiceOptions::default());

    assert!(service.add_log(Log::new("u1", "boot ok")).await.unwrap().success);

    let err = service.add_log(Log::new("u1", "boot fail")).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);

    let logs = service.get_logs(GetLogsRequest::default()).await.unwrap();
    assert!(logs.logs_string.contains("boot ok"));
    assert!(!logs.logs_string.contains("boot fail"));

    handle.release().await.unwrap();
}

#[tokio::test]
async fn empty_identifier_stores_nothing() {
    let config = LoggingConfig::parse("[store]\ncluster = \"scenario-empty-id\"").unwrap();
    let handle = StoreHandle::open(&config.store, 1).await.unwrap();
    let service = LoggingService::new(handle.store(), ServiceOptions::default());

    let err = service.add_log(Log::new("", "nobody")).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::InvalidArgument);

    let logs = service.get_logs(GetLogsRequest::default()).await.unwrap();
    assert_eq!(logs.logs_string, "");

    handle.release().await.unwrap();
}

#[tokio::test]
async fn instances_share_one_corpus() {
    let cluster = MemoryCluster::new("logging-cluster");
    let first: Arc<dyn MapStore> = Arc::new(cluster.join(1).unwrap().map("logging"));
    let second: Arc<dyn MapStore> = Arc::new(cluster.join(2).unwrap().map("logging"));
    let a = LoggingService::new(first, ServiceOptions::default());
    let b = LoggingService::new(second, ServiceOptions::default());

    a.add_log(Log::new("from-a", "alpha")).await.unwrap();
    b.add_log(Log::new("from-b", "beta")).await.unwrap();

    // The same identifier through another instance is still a conflict.
    let err = b.add_log(Log::new("from-a", "again")).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);

    for svc in [&a, &b] {
        let logs = svc.get_logs(GetLogsRequest::default()).await.unwrap();
        let mut lines: Vec<&str> = logs.logs_string.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["alpha", "beta"]);
    }
}
