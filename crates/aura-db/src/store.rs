//! Backend-agnostic record store.
//!
//! [`RecordStore`] dispatches to one of the concrete backends and adds
//! typed loaders used at startup hydration.

use aura_types::{ChatMessage, GenesisEntry, HyperBit, RecordKind};
use serde::de::DeserializeOwned;

use crate::dragonfly::DragonflyStore;
use crate::error::DbError;
use crate::memory::MemoryStore;
use crate::postgres::PostgresStore;

/// A connected record store.
#[derive(Clone)]
pub enum RecordStore {
    /// In-process maps.
    Memory(MemoryStore),
    /// One `Dragonfly` hash per kind.
    Dragonfly(DragonflyStore),
    /// The `records` table in `PostgreSQL`.
    Postgres(PostgresStore),
}

impl RecordStore {
    /// Short backend name for logs.
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Dragonfly(_) => "dragonfly",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Insert or overwrite `id` under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend write fails.
    pub async fn append(
        &self,
        kind: RecordKind,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<(), DbError> {
        match self {
            Self::Memory(store) => {
                store.append(kind, id, body).await;
                Ok(())
            }
            Self::Dragonfly(store) => store.append(kind, id, body).await,
            Self::Postgres(store) => store.append(kind, id, body).await,
        }
    }

    /// Every record of `kind`, as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend read fails.
    pub async fn load_all(&self, kind: RecordKind) -> Result<Vec<serde_json::Value>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.load_all(kind).await),
            Self::Dragonfly(store) => store.load_all(kind).await,
            Self::Postgres(store) => store.load_all(kind).await,
        }
    }

    /// Every particle, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails. Malformed records are skipped.
    pub async fn load_particles(&self) -> Result<Vec<HyperBit>, DbError> {
        let mut bits: Vec<HyperBit> = self.load_typed(RecordKind::Particles).await?;
        bits.sort_by_key(|b| b.timestamp);
        Ok(bits)
    }

    /// Every chat message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails. Malformed records are skipped.
    pub async fn load_messages(&self) -> Result<Vec<ChatMessage>, DbError> {
        let mut messages: Vec<ChatMessage> = self.load_typed(RecordKind::ChatMessages).await?;
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    /// Every audit entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails. Malformed records are skipped.
    pub async fn load_audit(&self) -> Result<Vec<GenesisEntry>, DbError> {
        let mut entries: Vec<GenesisEntry> = self.load_typed(RecordKind::AuditLog).await?;
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    /// Release backend connections. Pending writes should be flushed first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails to shut down cleanly.
    pub async fn close(&self) -> Result<(), DbError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Dragonfly(store) => store.close().await,
            Self::Postgres(store) => {
                store.close().await;
                Ok(())
            }
        }
    }

    async fn load_typed<T: DeserializeOwned>(&self, kind: RecordKind) -> Result<Vec<T>, DbError> {
        let raw = self.load_all(kind).await?;
        let total = raw.len();
        let parsed: Vec<T> = raw
            .into_iter()
            .filter_map(|body| match serde_json::from_value(body) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect();
        tracing::debug!(%kind, total, loaded = parsed.len(), "Loaded records");
        Ok(parsed)
    }
}

impl From<MemoryStore> for RecordStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<DragonflyStore> for RecordStore {
    fn from(store: DragonflyStore) -> Self {
        Self::Dragonfly(store)
    }
}

impl From<PostgresStore> for RecordStore {
    fn from(store: PostgresStore) -> Self {
        Self::Postgres(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aura_types::{GenesisId, MessageId, MessageRole};
    use chrono::{DateTime, TimeDelta, Utc};
    use serde_json::json;

    use super::*;

    fn message(text: &str, at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(),
            role: MessageRole::User,
            text: text.to_owned(),
            timestamp: at,
            introspection: None,
            attachment: None,
            mode: None,
        }
    }

    #[tokio::test]
    async fn messages_load_oldest_first() {
        let store = RecordStore::from(MemoryStore::new());
        let t0 = Utc::now();
        for (text, offset) in [("late", 20), ("early", 0), ("middle", 10)] {
            let msg = message(text, t0 + TimeDelta::seconds(offset));
            let body = serde_json::to_value(&msg).unwrap();
            store
                .append(RecordKind::ChatMessages, &msg.id.to_string(), &body)
                .await
                .unwrap();
        }

        let texts: Vec<String> = store
            .load_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn malformed_records_are_skipped() {
        let store = RecordStore::from(MemoryStore::new());
        store
            .append(RecordKind::Particles, "junk", &json!({"not": "a particle"}))
            .await
            .unwrap();
        assert!(store.load_particles().await.unwrap().is_empty());
        assert_eq!(store.load_all(RecordKind::Particles).await.unwrap().len(), 1);
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn audit_loads_oldest_first_and_memory_close_is_noop() {
        let store = RecordStore::from(MemoryStore::new());
        let t0 = Utc::now();
        for (tag, offset) in [("QUANTUM_COLLAPSE", 5), ("AURA_GENESIS", 0)] {
            let entry = GenesisEntry {
                id: GenesisId::new(),
                timestamp: t0 + TimeDelta::seconds(offset),
                action_type: tag.to_owned(),
                metadata: json!({}),
            };
            let body = serde_json::to_value(&entry).unwrap();
            store
                .append(RecordKind::AuditLog, &entry.id.to_string(), &body)
                .await
                .unwrap();
        }

        let tags: Vec<String> = store
            .load_audit()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action_type)
            .collect();
        assert_eq!(tags, vec!["AURA_GENESIS", "QUANTUM_COLLAPSE"]);
        assert!(store.close().await.is_ok());
    }
}
