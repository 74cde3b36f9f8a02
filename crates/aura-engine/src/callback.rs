//! Frame callback that feeds the operator API's `WebSocket` fan-out.

use std::sync::Arc;

use aura_core::runner::FrameCallback;
use aura_core::session::FrameSnapshot;
use aura_observer::state::AppState;
use tracing::trace;

/// Broadcasts every rendered frame to connected `WebSocket` clients.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl FrameCallback for ObserverCallback {
    fn on_frame(&mut self, snapshot: &FrameSnapshot) {
        let receivers = self.state.broadcast(snapshot);
        trace!(
            frames = snapshot.frames.len(),
            receivers,
            "Frame broadcast sent"
        );
    }
}
