//! `MapStore` over a Redis server shared by every logging instance.
//!
//! The map is one Redis hash; `insert_if_absent` is `HSETNX`, so admission
//! stays atomic per key no matter how many processes write. Cluster
//! membership is a `SET NX EX` key per member id, kept alive by a heartbeat
//! and deleted on close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;
use tokio::task::JoinHandle;

use logging_api::{MapStore, StoreError, StoreFuture};

// ═══════════════════════════════════════════════════════════════
//  RedisStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_map() -> String {
    "logging".to_string()
}

fn default_cluster() -> String {
    "logging-cluster".to_string()
}

fn default_member_ttl_secs() -> u64 {
    30
}

/// `[store]` keys understood by the redis backend.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RedisStoreConfig {
    /// Server to connect to.
    #[serde(default = "default_url")]
    pub url: String,
    /// Name of the distributed map the logs are kept in.
    #[serde(default = "default_map")]
    pub map: String,
    /// Key prefix shared by every instance of one deployment.
    #[serde(default = "default_cluster")]
    pub cluster: String,
    /// Membership expires this long after the last heartbeat.
    #[serde(default = "default_member_ttl_secs")]
    pub member_ttl_secs: u64,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            map: default_map(),
            cluster: default_cluster(),
            member_ttl_secs: default_member_ttl_secs(),
        }
    }
}

impl RedisStoreConfig {
    /// Hash holding the map entries.
    pub fn map_key(&self) -> String {
        format!("{}:map:{}", self.cluster, self.map)
    }

    /// Key that marks `member_id` as joined.
    pub fn member_key(&self, member_id: u32) -> String {
        format!("{}:member:{member_id}", self.cluster)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.map.is_empty() {
            return Err(StoreError::config("map name must not be empty"));
        }
        if self.cluster.is_empty() {
            return Err(StoreError::config("cluster name must not be empty"));
        }
        if self.member_ttl_secs == 0 {
            return Err(StoreError::config("member_ttl_secs must be positive"));
        }
        Ok(())
    }
}

fn redis_error(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::unavailable(e.to_string())
    } else {
        StoreError::logic(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════
//  RedisMapStore
// ═══════════════════════════════════════════════════════════════

pub struct RedisMapStore {
    conn: ConnectionManager,
    cluster: String,
    map_key: String,
    member_key: String,
    member_id: u32,
    open: AtomicBool,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl RedisMapStore {
    /// Connect to `config.url` and join `config.cluster` as `member_id`.
    ///
    /// Fails with a config error if a live member already holds the id.
    pub async fn connect(member_id: u32, config: &RedisStoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::config(format!("url '{}': {e}", config.url)))?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(|e| redis_error(e).with_context(format!("connect {}", config.url)))?;

        let member_key = config.member_key(member_id);
        let joined: Option<String> = redis::cmd("SET")
            .arg(&member_key)
            .arg(std::process::id())
            .arg("NX")
            .arg("EX")
            .arg(config.member_ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if joined.is_none() {
            return Err(StoreError::config(format!(
                "member {member_id} already joined cluster '{}'",
                config.cluster
            )));
        }
        tracing::info!(cluster = %config.cluster, member = member_id, url = %config.url, "member joined");

        let heartbeat = tokio::spawn(heartbeat(
            conn.clone(),
            member_key.clone(),
            config.member_ttl_secs,
        ));

        Ok(Self {
            conn,
            cluster: config.cluster.clone(),
            map_key: config.map_key(),
            member_key,
            member_id,
            open: AtomicBool::new(true),
            heartbeat: Mutex::new(Some(heartbeat)),
        })
    }

    pub fn member_id(&self) -> u32 {
        self.member_id
    }

    fn connection(&self) -> Result<ConnectionManager, StoreError> {
        if self.open.load(Ordering::Acquire) {
            Ok(self.conn.clone())
        } else {
            Err(StoreError::unavailable(format!(
                "member {} has left cluster '{}'",
                self.member_id, self.cluster
            )))
        }
    }

    fn stop_heartbeat(&self) {
        let mut slot: MutexGuard<'_, Option<JoinHandle<()>>> = match self.heartbeat.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

/// Refresh the membership key a few times per TTL until aborted.
async fn heartbeat(mut conn: ConnectionManager, member_key: String, ttl_secs: u64) {
    let period = Duration::from_millis((ttl_secs * 1000 / 3).max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let refreshed: Result<bool, _> = redis::cmd("EXPIRE")
            .arg(&member_key)
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await;
        match refreshed {
            Ok(true) => {}
            Ok(false) => tracing::warn!(key = %member_key, "membership key expired"),
            Err(e) => tracing::warn!(key = %member_key, error = %e, "membership heartbeat failed"),
        }
    }
}

impl Drop for RedisMapStore {
    fn drop(&mut self) {
        self.stop_heartbeat();
    }
}

impl MapStore for RedisMapStore {
    fn exists(&self, key: &str) -> StoreFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.connection()?;
            let found: bool = conn.hexists(&self.map_key, &key).await.map_err(redis_error)?;
            Ok(found)
        })
    }

    fn get(&self, key: &str) -> StoreFuture<'_, Option<Value>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.connection()?;
            let raw: Option<String> = conn.hget(&self.map_key, &key).await.map_err(redis_error)?;
            match raw {
                Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
                None => Ok(None),
            }
        })
    }

    fn insert_if_absent(&self, key: &str, value: Value) -> StoreFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.connection()?;
            let payload = serde_json::to_string(&value)?;
            let inserted: bool = conn
                .hset_nx(&self.map_key, &key, payload)
                .await
                .map_err(redis_error)?;
            Ok(inserted)
        })
    }

    fn put(&self, key: &str, value: Value) -> StoreFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.connection()?;
            let payload = serde_json::to_string(&value)?;
            let _: i64 = conn.hset(&self.map_key, &key, payload).await.map_err(redis_error)?;
            Ok(())
        })
    }

    fn values(&self) -> StoreFuture<'_, Vec<Value>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            let raw: Vec<String> = conn.hvals(&self.map_key).await.map_err(redis_error)?;
            raw.iter()
                .map(|entry| serde_json::from_str(entry).map_err(StoreError::from))
                .collect()
        })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if !self.open.swap(false, Ordering::AcqRel) {
                return Ok(());
            }
            self.stop_heartbeat();
            let mut conn = self.conn.clone();
            let _: i64 = conn.del(&self.member_key).await.map_err(redis_error)?;
            tracing::info!(cluster = %self.cluster, member = self.member_id, "member left");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use logging_api::ErrorKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn config_defaults_and_keys() {
        let config: RedisStoreConfig = serde_json::from_value(json!({"map": "audit"})).unwrap();

        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.member_ttl_secs, 30);
        assert_eq!(config.map_key(), "logging-cluster:map:audit");
        assert_eq!(config.member_key(3), "logging-cluster:member:3");
    }

    #[test]
    fn validate_rejects_empty_names_and_zero_ttl() {
        let empty_map = RedisStoreConfig { map: String::new(), ..Default::default() };
        assert_eq!(empty_map.validate().unwrap_err().kind, ErrorKind::Config);

        let zero_ttl = RedisStoreConfig { member_ttl_secs: 0, ..Default::default() };
        assert_eq!(zero_ttl.validate().unwrap_err().kind, ErrorKind::Config);

        assert!(RedisStoreConfig::default().validate().is_ok());
    }

    #[test]
    fn connection_failures_are_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(redis_error(redis::RedisError::from(io)).kind, ErrorKind::Unavailable);

        let typed = redis::RedisError::from((redis::ErrorKind::TypeError, "not a hash"));
        assert_eq!(redis_error(typed).kind, ErrorKind::Logic);
    }

    #[tokio::test]
    async fn bad_url_is_config_error() {
        let config = RedisStoreConfig { url: "not a url".to_string(), ..Default::default() };
        let err = RedisMapStore::connect(1, &config).await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::Config);
    }
}
