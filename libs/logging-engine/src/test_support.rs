use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use logging_api::{MapStore, StoreError, StoreFuture};
use storage_memory::MemoryCluster;

pub(crate) fn memory_store() -> Arc<dyn MapStore> {
    let cluster = MemoryCluster::new("test");
    Arc::new(cluster.join(1).unwrap().map("logging"))
}

/// Every call fails as if the cluster were unreachable.
pub(crate) struct FailingStore;

impl FailingStore {
    fn fail<T: Send + 'static>() -> StoreFuture<'static, T> {
        Box::pin(async { Err(StoreError::unavailable("cluster unreachable")) })
    }
}

impl MapStore for FailingStore {
    fn exists(&self, _key: &str) -> StoreFuture<'_, bool> {
        Self::fail()
    }

    fn get(&self, _key: &str) -> StoreFuture<'_, Option<Value>> {
        Self::fail()
    }

    fn insert_if_absent(&self, _key: &str, _value: Value) -> StoreFuture<'_, bool> {
        Self::fail()
    }

    fn put(&self, _key: &str, _value: Value) -> StoreFuture<'_, ()> {
        Self::fail()
    }

    fn values(&self) -> StoreFuture<'_, Vec<Value>> {
        Self::fail()
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// Delegates to `inner` after sleeping `delay` on every call.
pub(crate) struct SlowStore {
    pub inner: Arc<dyn MapStore>,
    pub delay: Duration,
}

impl MapStore for SlowStore {
    fn exists(&self, key: &str) -> StoreFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.exists(&key).await
        })
    }

    fn get(&self, key: &str) -> StoreFuture<'_, Option<Value>> {
        let key = key.to_string();
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.get(&key).await
        })
    }

    fn insert_if_absent(&self, key: &str, value: Value) -> StoreFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.insert_if_absent(&key, value).await
        })
    }

    fn put(&self, key: &str, value: Value) -> StoreFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.put(&key, value).await
        })
    }

    fn values(&self) -> StoreFuture<'_, Vec<Value>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.values().await
        })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        self.inner.close()
    }
}

/// A store whose writes are already on the wire when the call starts:
/// `insert_if_absent` lands `delay` later even if the caller stops waiting.
pub(crate) struct DetachedWriteStore {
    pub inner: Arc<dyn MapStore>,
    pub delay: Duration,
}

impl MapStore for DetachedWriteStore {
    fn exists(&self, key: &str) -> StoreFuture<'_, bool> {
        self.inner.exists(key)
    }

    fn get(&self, key: &str) -> StoreFuture<'_, Option<Value>> {
        self.inner.get(key)
    }

    fn insert_if_absent(&self, key: &str, value: Value) -> StoreFuture<'_, bool> {
        let inner = self.inner.clone();
        let key = key.to_string();
        let delay = self.delay;
        let write = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.insert_if_absent(&key, value).await
        });
        Box::pin(async move { write.await.map_err(|e| StoreError::logic(e.to_string()))? })
    }

    fn put(&self, key: &str, value: Value) -> StoreFuture<'_, ()> {
        self.inner.put(key, value)
    }

    fn values(&self) -> StoreFuture<'_, Vec<Value>> {
        self.inner.values()
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        self.inner.close()
    }
}
