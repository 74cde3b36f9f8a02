//! Fire-and-forget persistence outbox.
//!
//! The session appends to its in-memory state synchronously and queues a
//! [`PendingWrite`] for each record that should become durable. The loop
//! drains the queue into a [`WriteDispatcher`] after every step. Whatever
//! the dispatcher does with a write, success or failure, never feeds back
//! into the session.

use aura_types::RecordKind;
use serde::Serialize;

/// A record waiting to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    /// Collection the record belongs to.
    pub kind: RecordKind,
    /// Record id; re-saving the same id overwrites.
    pub id: String,
    /// Serialized record.
    pub body: serde_json::Value,
}

impl PendingWrite {
    /// Serialize `record` for `kind` under `id`.
    pub fn new(
        kind: RecordKind,
        id: impl ToString,
        record: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind,
            id: id.to_string(),
            body: serde_json::to_value(record)?,
        })
    }
}

/// Sink for drained writes.
pub trait WriteDispatcher: Send {
    /// Hand off a batch of writes. Must not block the loop.
    fn dispatch(&mut self, writes: Vec<PendingWrite>);
}

/// Drops every write. For runs without persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardWrites;

impl WriteDispatcher for DiscardWrites {
    fn dispatch(&mut self, writes: Vec<PendingWrite>) {
        tracing::trace!(count = writes.len(), "Discarding writes");
    }
}

/// Keeps every write in memory. Useful in tests.
#[derive(Debug, Clone, Default)]
pub struct CollectWrites {
    /// Everything dispatched so far, in order.
    pub writes: Vec<PendingWrite>,
}

impl CollectWrites {
    /// Writes of one kind, in order.
    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &PendingWrite> {
        self.writes.iter().filter(move |w| w.kind == kind)
    }
}

impl WriteDispatcher for CollectWrites {
    fn dispatch(&mut self, writes: Vec<PendingWrite>) {
        self.writes.extend(writes);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aura_types::{ChatMessage, MessageId, MessageRole};
    use chrono::Utc;

    use super::*;

    #[test]
    fn pending_write_carries_id_and_body() {
        let msg = ChatMessage {
            id: MessageId::new(),
            role: MessageRole::Ai,
            text: "hi".to_owned(),
            timestamp: Utc::now(),
            introspection: None,
            attachment: None,
            mode: None,
        };
        let write = PendingWrite::new(RecordKind::ChatMessages, msg.id, &msg).unwrap();
        assert_eq!(write.id, msg.id.to_string());
        assert_eq!(write.body["text"], "hi");
    }

    #[test]
    fn collect_filters_by_kind() {
        let mut sink = CollectWrites::default();
        sink.dispatch(vec![
            PendingWrite::new(RecordKind::Particles, "a", &1).unwrap(),
            PendingWrite::new(RecordKind::AuditLog, "b", &2).unwrap(),
        ]);
        assert_eq!(sink.of_kind(RecordKind::AuditLog).count(), 1);
    }
}
