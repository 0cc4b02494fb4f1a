use std::sync::Arc;

use logging_api::MapStore;
use storage_memory::{MemoryCluster, MemoryMapStore, MemoryStoreConfig};
use storage_redis::{RedisMapStore, RedisStoreConfig};

use crate::config::StoreConfig;
use crate::error::LoggingError;

/// The process-wide store handle.
///
/// Acquired once at startup and shared by every request. `release` leaves
/// the cluster; a handle dropped without `release` (early return, panic
/// unwinding) schedules the same on the current runtime.
pub struct StoreHandle {
    store: Arc<dyn MapStore>,
    backend: String,
    member_id: u32,
    released: bool,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("backend", &self.backend)
            .field("member_id", &self.member_id)
            .field("released", &self.released)
            .finish()
    }
}

impl StoreHandle {
    /// Connect to the store described by `config` as cluster member `member_id`.
    ///
    /// `memory` clusters live inside this process only; instances in other
    /// processes share a map through `redis`.
    pub async fn open(config: &StoreConfig, member_id: u32) -> Result<Self, LoggingError> {
        let store: Arc<dyn MapStore> = match config.backend.as_str() {
            "memory" => {
                let settings: MemoryStoreConfig = config.settings()?;
                let cluster = MemoryCluster::shared(&settings.cluster);
                tracing::warn!(
                    cluster = %settings.cluster,
                    "memory store is local to this process, other processes will not see it"
                );
                Arc::new(MemoryMapStore::open(&cluster, member_id, &settings)?)
            }
            "redis" => {
                let settings: RedisStoreConfig = config.settings()?;
                Arc::new(RedisMapStore::connect(member_id, &settings).await?)
            }
            other => {
                return Err(LoggingError::Config(format!("unknown store backend '{other}'")));
            }
        };

        tracing::info!(backend = %config.backend, member = member_id, "store handle acquired");
        Ok(Self::attach(store, config.backend.clone(), member_id))
    }

    /// Wrap an already connected store.
    pub fn attach(store: Arc<dyn MapStore>, backend: impl Into<String>, member_id: u32) -> Self {
        Self {
            store,
            backend: backend.into(),
            member_id,
            released: false,
        }
    }

    pub fn store(&self) -> Arc<dyn MapStore> {
        self.store.clone()
    }

    pub fn member_id(&self) -> u32 {
        self.member_id
    }

    /// Leave the cluster.
    pub async fn release(mut self) -> Result<(), LoggingError> {
        self.released = true;
        self.store.close().await?;
        tracing::info!(backend = %self.backend, member = self.member_id, "store handle released");
        Ok(())
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::warn!(member = self.member_id, "store handle dropped without release, closing");
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let store = self.store.clone();
            runtime.spawn(async move {
                if let Err(e) = store.close().await {
                    tracing::error!(error = %e, "failed to close store handle");
                }
            });
        }
    }
}
