//! In-process record store.
//!
//! Backs offline runs and tests. Contents live as long as the store (and
//! its clones) do.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use aura_types::RecordKind;
use tokio::sync::RwLock;

/// Records keyed by kind, then id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<RecordKind, BTreeMap<String, serde_json::Value>>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `id` under `kind`.
    pub async fn append(&self, kind: RecordKind, id: &str, body: &serde_json::Value) {
        let mut records = self.records.write().await;
        records
            .entry(kind)
            .or_default()
            .insert(id.to_owned(), body.clone());
    }

    /// Every record of `kind`, ordered by id.
    pub async fn load_all(&self, kind: RecordKind) -> Vec<serde_json::Value> {
        let records = self.records.read().await;
        records
            .get(&kind)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of records of `kind`.
    pub async fn count(&self, kind: RecordKind) -> usize {
        self.records.read().await.get(&kind).map_or(0, BTreeMap::len)
    }
}
