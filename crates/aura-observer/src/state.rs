//! Shared application state for the operator API server.
//!
//! [`AppState`] holds the engine command handle, the completion oracle,
//! and the broadcast channel that carries frame snapshots to `WebSocket`
//! clients. Every read goes through the engine queue, so a response
//! always reflects the state after the most recent tick.

use std::sync::Arc;

use aura_core::commands::EngineHandle;
use aura_core::session::FrameSnapshot;
use aura_oracle::Oracle;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for frame snapshots.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Sender side of the engine command queue.
    pub engine: EngineHandle,
    /// Completion and dream-image collaborator.
    pub oracle: Arc<Oracle>,
    /// Broadcast sender for frame snapshots.
    pub tx: broadcast::Sender<FrameSnapshot>,
}

impl AppState {
    /// Create a new application state around a running engine.
    pub fn new(engine: EngineHandle, oracle: Oracle) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            engine,
            oracle: Arc::new(oracle),
            tx,
        }
    }

    /// Subscribe to the frame broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameSnapshot> {
        self.tx.subscribe()
    }

    /// Publish a snapshot to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, snapshot: &FrameSnapshot) -> usize {
        // send returns Err only when there are zero receivers.
        self.tx.send(snapshot.clone()).unwrap_or(0)
    }
}
