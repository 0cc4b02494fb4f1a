use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::StoreError;

/// Boxed future returned by every `MapStore` method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Client handle to the cluster-wide replicated map the logs live in.
///
/// Writes made through any member are visible to every member. The handle
/// is shared by all in-flight requests, so implementations must be safe
/// for concurrent use.
pub trait MapStore: Send + Sync {
    /// Whether `key` is present.
    fn exists(&self, key: &str) -> StoreFuture<'_, bool>;

    /// Point lookup.
    fn get(&self, key: &str) -> StoreFuture<'_, Option<Value>>;

    /// Store `value` under `key` only if `key` is absent.
    ///
    /// Returns `true` when this call stored the value and `false` when the
    /// key was already present (nothing written). Atomic per key: of any
    /// number of concurrent calls for one key, at most one returns `true`.
    fn insert_if_absent(&self, key: &str, value: Value) -> StoreFuture<'_, bool>;

    /// Unconditional write. Never use this alone to admit a record.
    fn put(&self, key: &str, value: Value) -> StoreFuture<'_, ()>;

    /// Snapshot of every stored value. No ordering across keys.
    fn values(&self) -> StoreFuture<'_, Vec<Value>>;

    /// Leave the cluster. Calls made after this fail with `Unavailable`.
    fn close(&self) -> StoreFuture<'_, ()>;
}
