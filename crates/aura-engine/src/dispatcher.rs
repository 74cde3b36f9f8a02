//! Persistence dispatcher backed by a [`RecordStore`].
//!
//! Each drained batch is written on its own task so the engine loop never
//! waits on I/O. A failed write is logged and otherwise ignored: the
//! in-memory session stays authoritative for the rest of the run. Batch
//! tasks are tracked so shutdown can wait for them with [`StoreDispatcher::flush`].

use std::time::Duration;

use aura_core::outbox::{PendingWrite, WriteDispatcher};
use aura_db::RecordStore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Writes drained outbox batches to the configured store.
pub struct StoreDispatcher {
    store: RecordStore,
    in_flight: JoinSet<()>,
}

impl StoreDispatcher {
    /// Dispatch into `store`.
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            in_flight: JoinSet::new(),
        }
    }

    /// Batches still being written.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Wait up to `timeout` for every dispatched batch to finish. Returns
    /// `false` if batches were still running when the timeout hit; those
    /// are aborted.
    pub async fn flush(&mut self, timeout: Duration) -> bool {
        let pending = self.in_flight.len();
        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = self.in_flight.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Write batch task failed");
                }
            }
        })
        .await
        .is_ok();

        if drained {
            info!(batches = pending, "Pending writes flushed");
        } else {
            warn!(
                remaining = self.in_flight.len(),
                "Write flush timed out, aborting remaining batches"
            );
            self.in_flight.abort_all();
        }
        drained
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.in_flight.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "Write batch task failed");
            }
        }
    }
}

impl WriteDispatcher for StoreDispatcher {
    fn dispatch(&mut self, writes: Vec<PendingWrite>) {
        self.reap_finished();
        if writes.is_empty() {
            return;
        }
        let store = self.store.clone();
        self.in_flight.spawn(async move {
            let count = writes.len();
            for write in writes {
                if let Err(e) = store.append(write.kind, &write.id, &write.body).await {
                    warn!(
                        backend = store.backend_name(),
                        kind = ?write.kind,
                        id = %write.id,
                        error = %e,
                        "Failed to persist record"
                    );
                }
            }
            debug!(backend = store.backend_name(), count, "Write batch persisted");
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use aura_db::MemoryStore;
    use aura_types::RecordKind;
    use serde_json::json;

    use super::*;

    fn write(kind: RecordKind, id: &str) -> PendingWrite {
        PendingWrite::new(kind, id, &json!({ "id": id })).unwrap()
    }

    #[tokio::test]
    async fn flush_waits_for_every_batch() {
        let memory = MemoryStore::new();
        let mut dispatcher = StoreDispatcher::new(RecordStore::from(memory.clone()));

        dispatcher.dispatch(vec![
            write(RecordKind::Particles, "a"),
            write(RecordKind::ChatMessages, "b"),
        ]);
        dispatcher.dispatch(vec![write(RecordKind::AuditLog, "c")]);

        assert!(dispatcher.flush(Duration::from_secs(5)).await);
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(memory.count(RecordKind::Particles).await, 1);
        assert_eq!(memory.count(RecordKind::ChatMessages).await, 1);
        assert_eq!(memory.count(RecordKind::AuditLog).await, 1);
    }

    #[tokio::test]
    async fn empty_batch_spawns_nothing() {
        let memory = MemoryStore::new();
        let mut dispatcher = StoreDispatcher::new(RecordStore::from(memory.clone()));
        dispatcher.dispatch(Vec::new());
        assert_eq!(dispatcher.in_flight(), 0);
        assert!(dispatcher.flush(Duration::from_millis(10)).await);
        assert_eq!(memory.count(RecordKind::AuditLog).await, 0);
    }

    #[tokio::test]
    async fn finished_batches_are_reaped_on_dispatch() {
        let memory = MemoryStore::new();
        let mut dispatcher = StoreDispatcher::new(RecordStore::from(memory.clone()));
        dispatcher.dispatch(vec![write(RecordKind::Particles, "a")]);
        assert!(dispatcher.flush(Duration::from_secs(5)).await);

        dispatcher.dispatch(vec![write(RecordKind::Particles, "b")]);
        assert!(dispatcher.in_flight() <= 1);
        assert!(dispatcher.flush(Duration::from_secs(5)).await);
        assert_eq!(memory.count(RecordKind::Particles).await, 2);
    }
}
