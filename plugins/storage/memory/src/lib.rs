use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde_json::Value;
use tokio::sync::RwLock;

use logging_api::{MapStore, StoreError, StoreFuture};

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_map() -> String {
    "logging".to_string()
}

fn default_cluster() -> String {
    "logging-cluster".to_string()
}

/// `[store]` keys understood by the memory backend.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct MemoryStoreConfig {
    /// Name of the distributed map the logs are kept in.
    #[serde(default = "default_map")]
    pub map: String,
    /// Cluster to join.
    #[serde(default = "default_cluster")]
    pub cluster: String,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            map: default_map(),
            cluster: default_cluster(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryCluster
// ═══════════════════════════════════════════════════════════════

type Entries = Arc<RwLock<HashMap<String, Value>>>;

#[derive(Default)]
struct ClusterState {
    members: BTreeSet<u32>,
    maps: HashMap<String, Entries>,
}

/// In-process stand-in for a replicated map cluster.
///
/// Every member that opens a map with the same name gets a handle to the
/// same entries, so a write through one member is immediately visible to
/// all of them. Nothing is shared across processes.
#[derive(Clone)]
pub struct MemoryCluster {
    name: String,
    state: Arc<Mutex<ClusterState>>,
}

impl std::fmt::Debug for MemoryCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCluster")
            .field("name", &self.name)
            .field("members", &self.members())
            .finish()
    }
}

impl MemoryCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(ClusterState::default())),
        }
    }

    /// The process-wide cluster called `name`, created on first use.
    pub fn shared(name: &str) -> Self {
        static CLUSTERS: OnceLock<Mutex<HashMap<String, MemoryCluster>>> = OnceLock::new();

        let registry = CLUSTERS.get_or_init(Default::default);
        let mut clusters = match registry.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("cluster registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        clusters
            .entry(name.to_string())
            .or_insert_with(|| MemoryCluster::new(name))
            .clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `member_id` with the cluster.
    pub fn join(&self, member_id: u32) -> Result<Member, StoreError> {
        let mut state = self.lock();
        if !state.members.insert(member_id) {
            return Err(StoreError::config(format!(
                "member {member_id} already joined cluster '{}'",
                self.name
            )));
        }
        tracing::info!(cluster = %self.name, member = member_id, "member joined");
        Ok(Member {
            inner: Arc::new(MemberInner {
                id: member_id,
                cluster: self.clone(),
                open: AtomicBool::new(true),
            }),
        })
    }

    /// Ids of the members currently joined, ascending.
    pub fn members(&self) -> Vec<u32> {
        self.lock().members.iter().copied().collect()
    }

    fn entries(&self, map: &str) -> Entries {
        self.lock().maps.entry(map.to_string()).or_default().clone()
    }

    fn leave(&self, member_id: u32) {
        self.lock().members.remove(&member_id);
        tracing::info!(cluster = %self.name, member = member_id, "member left");
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!(cluster = %self.name, "cluster state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Member
// ═══════════════════════════════════════════════════════════════

struct MemberInner {
    id: u32,
    cluster: MemoryCluster,
    open: AtomicBool,
}

impl MemberInner {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::unavailable(format!(
                "member {} has left cluster '{}'",
                self.id, self.cluster.name
            )))
        }
    }

    fn leave(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            self.cluster.leave(self.id);
        }
    }
}

/// Cluster membership of one service instance.
#[derive(Clone)]
pub struct Member {
    inner: Arc<MemberInner>,
}

impl Member {
    pub fn id(&self) -> u32 {
        self.inner.id
    }

    /// Handle to the named map, shared cluster-wide.
    pub fn map(&self, name: &str) -> MemoryMapStore {
        MemoryMapStore {
            name: name.to_string(),
            entries: self.inner.cluster.entries(name),
            member: self.inner.clone(),
        }
    }

    /// Leave the cluster. Every map handle of this member becomes unavailable.
    pub fn leave(&self) {
        self.inner.leave();
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryMapStore
// ═══════════════════════════════════════════════════════════════

/// `MapStore` over a cluster map, as seen by one member.
pub struct MemoryMapStore {
    name: String,
    entries: Entries,
    member: Arc<MemberInner>,
}

impl MemoryMapStore {
    /// Join `config.cluster` as `member_id` and open `config.map`.
    pub fn open(
        cluster: &MemoryCluster,
        member_id: u32,
        config: &MemoryStoreConfig,
    ) -> Result<Self, StoreError> {
        if config.map.is_empty() {
            return Err(StoreError::config("map name must not be empty"));
        }
        if cluster.name() != config.cluster {
            return Err(StoreError::config(format!(
                "configured cluster '{}' does not match '{}'",
                config.cluster,
                cluster.name()
            )));
        }
        Ok(cluster.join(member_id)?.map(&config.map))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_id(&self) -> u32 {
        self.member.id
    }
}

impl MapStore for MemoryMapStore {
    fn exists(&self, key: &str) -> StoreFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().await;
            self.member.ensure_open()?;
            Ok(entries.contains_key(&key))
        })
    }

    fn get(&self, key: &str) -> StoreFuture<'_, Option<Value>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().await;
            self.member.ensure_open()?;
            Ok(entries.get(&key).cloned())
        })
    }

    fn insert_if_absent(&self, key: &str, value: Value) -> StoreFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            // Open check, lookup and insert all happen under one guard.
            let mut entries = self.entries.write().await;
            self.member.ensure_open()?;
            match entries.entry(key) {
                Entry::Occupied(_) => Ok(false),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                    Ok(true)
                }
            }
        })
    }

    fn put(&self, key: &str, value: Value) -> StoreFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().await;
            self.member.ensure_open()?;
            entries.insert(key, value);
            Ok(())
        })
    }

    fn values(&self) -> StoreFuture<'_, Vec<Value>> {
        Box::pin(async move {
            let entries = self.entries.read().await;
            self.member.ensure_open()?;
            Ok(entries.values().cloned().collect())
        })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            // Waits out writes already holding the map, so none lands after close returns.
            let _entries = self.entries.write().await;
            self.member.leave();
            Ok(())
        })
    }
}
