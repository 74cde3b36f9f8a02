//! Render sync: per-particle frames and presentation-handle reconciliation.
//!
//! [`evaluate_frames`] is the pure half: for every record in registry order
//! it runs the trajectory function at the cursor and produces a
//! [`ParticleFrame`]. [`RenderSync`] is the stateful half: it keeps a stable
//! `id -> handle` arena for a [`PresentationBackend`], reconciles handles
//! when membership changes, and skips work when neither the cursor nor the
//! membership moved since the last pass.

use std::collections::{HashMap, HashSet};

use aura_types::{HyperBit, HyperBitId, ParticleFrame};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

use crate::registry::ParticleRegistry;
use crate::trajectory::{self, DEFAULT_FRESH_WINDOW};

/// A consumer of particle frames that owns one handle per particle
/// (a scene node, a DOM element, a GPU instance slot).
pub trait PresentationBackend {
    /// Per-particle presentation handle.
    type Handle: core::fmt::Debug;

    /// Allocate a handle for a newly known particle.
    fn create(&mut self, bit: &HyperBit) -> Self::Handle;

    /// Apply a frame to an existing handle.
    fn update(&mut self, handle: &mut Self::Handle, frame: &ParticleFrame);

    /// Release a handle whose particle is no longer known.
    fn destroy(&mut self, handle: Self::Handle);
}

/// Evaluate every registered particle at `cursor`, in insertion order.
pub fn evaluate_frames(
    registry: &ParticleRegistry,
    cursor: DateTime<Utc>,
    fresh_window: TimeDelta,
) -> Vec<ParticleFrame> {
    registry
        .iter()
        .map(|bit| {
            let eval = trajectory::evaluate(bit, cursor, fresh_window);
            ParticleFrame {
                id: bit.id,
                visible: eval.is_visible(),
                position: eval.position,
                highlight_intensity: eval.highlight_intensity(),
                freshness: eval.freshness,
                collapsed: registry.is_collapsed(bit.id),
            }
        })
        .collect()
}

/// Stateful render-sync pass over a presentation backend.
#[derive(Debug)]
pub struct RenderSync<B: PresentationBackend> {
    backend: B,
    handles: HashMap<HyperBitId, B::Handle>,
    fresh_window: TimeDelta,
    last_cursor: Option<DateTime<Utc>>,
    last_count: Option<usize>,
    dirty: bool,
    frames: Vec<ParticleFrame>,
}

impl<B: PresentationBackend> RenderSync<B> {
    /// Wrap a backend with the default two-second fresh window.
    pub fn new(backend: B) -> Self {
        Self::with_fresh_window(backend, DEFAULT_FRESH_WINDOW)
    }

    /// Wrap a backend with a custom fresh window.
    pub fn with_fresh_window(backend: B, fresh_window: TimeDelta) -> Self {
        Self {
            backend,
            handles: HashMap::new(),
            fresh_window,
            last_cursor: None,
            last_count: None,
            dirty: true,
            frames: Vec::new(),
        }
    }

    /// Whether a pass at `cursor` over `count` records would do any work.
    pub fn needs_sync(&self, cursor: DateTime<Utc>, count: usize) -> bool {
        self.dirty || self.last_cursor != Some(cursor) || self.last_count != Some(count)
    }

    /// Force the next pass to run (e.g. after a quantum observation).
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Run a pass if the cursor or membership changed. Returns whether it ran.
    pub fn sync(&mut self, registry: &ParticleRegistry, cursor: DateTime<Utc>) -> bool {
        if !self.needs_sync(cursor, registry.len()) {
            return false;
        }
        if self.last_count != Some(registry.len()) {
            self.reconcile(registry);
        }

        self.frames = evaluate_frames(registry, cursor, self.fresh_window);
        for frame in &self.frames {
            if let Some(handle) = self.handles.get_mut(&frame.id) {
                self.backend.update(handle, frame);
            }
        }

        self.last_cursor = Some(cursor);
        self.last_count = Some(registry.len());
        self.dirty = false;
        true
    }

    /// Allocate handles for new particles and release handles for
    /// particles the registry no longer knows.
    fn reconcile(&mut self, registry: &ParticleRegistry) {
        let known: HashSet<HyperBitId> = registry.iter().map(|b| b.id).collect();
        let stale: Vec<HyperBitId> = self
            .handles
            .keys()
            .filter(|id| !known.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(handle) = self.handles.remove(&id) {
                self.backend.destroy(handle);
            }
        }

        let mut created = 0_usize;
        for bit in registry.iter() {
            if !self.handles.contains_key(&bit.id) {
                let handle = self.backend.create(bit);
                self.handles.insert(bit.id, handle);
                created = created.saturating_add(1);
            }
        }
        trace!(created, total = self.handles.len(), "Presentation handles reconciled");
    }

    /// Frames produced by the most recent pass.
    pub fn frames(&self) -> &[ParticleFrame] {
        &self.frames
    }

    /// Number of live presentation handles.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// The handle for a particle, if allocated.
    pub fn handle(&self, id: HyperBitId) -> Option<&B::Handle> {
        self.handles.get(&id)
    }

    /// The wrapped backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Tear down every handle. Used when the view is disposed.
    pub fn dispose(&mut self) {
        for (_, handle) in self.handles.drain() {
            self.backend.destroy(handle);
        }
        self.frames.clear();
        self.last_cursor = None;
        self.last_count = None;
        self.dirty = true;
    }
}

/// A backend with no scene graph: handles are stable slot numbers and the
/// latest frame per slot is kept for inspection.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_slot: u64,
    created: u64,
    destroyed: u64,
    updates: u64,
}

/// Handle issued by [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessHandle {
    /// Slot number, unique for the backend's lifetime.
    pub slot: u64,
    /// Last frame applied, if any.
    pub last_frame: Option<ParticleFrame>,
}

impl HeadlessBackend {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles created so far.
    pub const fn created(&self) -> u64 {
        self.created
    }

    /// Handles destroyed so far.
    pub const fn destroyed(&self) -> u64 {
        self.destroyed
    }

    /// Frames applied so far.
    pub const fn updates(&self) -> u64 {
        self.updates
    }
}

impl PresentationBackend for HeadlessBackend {
    type Handle = HeadlessHandle;

    fn create(&mut self, _bit: &HyperBit) -> HeadlessHandle {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.saturating_add(1);
        self.created = self.created.saturating_add(1);
        HeadlessHandle {
            slot,
            last_frame: None,
        }
    }

    fn update(&mut self, handle: &mut HeadlessHandle, frame: &ParticleFrame) {
        handle.last_frame = Some(frame.clone());
        self.updates = self.updates.saturating_add(1);
    }

    fn destroy(&mut self, _handle: HeadlessHandle) {
        self.destroyed = self.destroyed.saturating_add(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aura_types::{Freshness, ParticleKind, Vec3};

    use super::*;
    use crate::physics;

    fn base() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_716_700_000_000).unwrap()
    }

    fn bit_at(offset_ms: i64) -> HyperBit {
        HyperBit {
            id: HyperBitId::new(),
            kind: ParticleKind::Electron,
            physics: physics::properties(ParticleKind::Electron),
            quantum: physics::new_quantum_state(),
            position: Vec3::new(30.0, 30.0, 30.0),
            velocity: Vec3::new(1.0, 0.0, 0.0),
            timestamp: base() + TimeDelta::milliseconds(offset_ms),
        }
    }

    #[test]
    fn frames_follow_insertion_order_and_gate_on_birth() {
        let mut reg = ParticleRegistry::new();
        let late = bit_at(5_000);
        let early = bit_at(0);
        reg.append(late.clone());
        reg.append(early.clone());

        let cursor = base() + TimeDelta::milliseconds(1_000);
        let frames = evaluate_frames(&reg, cursor, DEFAULT_FRESH_WINDOW);
        assert_eq!(frames.len(), 2);
        let first = frames.first().unwrap();
        let second = frames.get(1).unwrap();
        assert_eq!(first.id, late.id);
        assert!(!first.visible);
        assert_eq!(first.position, None);
        assert_eq!(second.id, early.id);
        assert!(second.visible);
        assert_eq!(second.freshness, Freshness::RecentlyBorn);
    }

    #[test]
    fn skips_pass_when_nothing_changed() {
        let mut reg = ParticleRegistry::new();
        reg.append(bit_at(0));
        let mut sync = RenderSync::new(HeadlessBackend::new());
        let cursor = base() + TimeDelta::milliseconds(10);

        assert!(sync.sync(&reg, cursor));
        assert!(!sync.sync(&reg, cursor));
        assert!(sync.sync(&reg, cursor + TimeDelta::milliseconds(16)));
        assert_eq!(sync.backend().updates(), 2);
    }

    #[test]
    fn membership_change_reruns_at_same_cursor() {
        let mut reg = ParticleRegistry::new();
        reg.append(bit_at(0));
        let mut sync = RenderSync::new(HeadlessBackend::new());
        let cursor = base() + TimeDelta::milliseconds(10);
        sync.sync(&reg, cursor);

        reg.append(bit_at(5));
        assert!(sync.sync(&reg, cursor));
        assert_eq!(sync.frames().len(), 2);
        assert_eq!(sync.handle_count(), 2);
        assert_eq!(sync.backend().created(), 2);
    }

    #[test]
    fn handles_are_stable_across_growth() {
        let mut reg = ParticleRegistry::new();
        let first = bit_at(0);
        let first_id = first.id;
        reg.append(first);
        let mut sync = RenderSync::new(HeadlessBackend::new());
        sync.sync(&reg, base());
        let slot = sync.handle(first_id).unwrap().slot;

        for i in 1..10 {
            reg.append(bit_at(i));
            sync.sync(&reg, base() + TimeDelta::milliseconds(i));
        }
        assert_eq!(sync.handle(first_id).unwrap().slot, slot);
        assert_eq!(sync.backend().created(), 10);
        assert_eq!(sync.backend().destroyed(), 0);
    }

    #[test]
    fn reconcile_releases_unknown_handles() {
        let mut reg = ParticleRegistry::new();
        reg.append(bit_at(0));
        reg.append(bit_at(1));
        let mut sync = RenderSync::new(HeadlessBackend::new());
        sync.sync(&reg, base());

        // A fresh registry with a single different particle, as after
        // swapping sessions under the same view.
        let mut other = ParticleRegistry::new();
        other.append(bit_at(2));
        sync.sync(&other, base());
        assert_eq!(sync.handle_count(), 1);
        assert_eq!(sync.backend().destroyed(), 2);
    }

    #[test]
    fn invalidate_forces_rerun() {
        let mut reg = ParticleRegistry::new();
        let bit = bit_at(0);
        let id = bit.id;
        reg.append(bit);
        let mut sync = RenderSync::new(HeadlessBackend::new());
        let cursor = base() + TimeDelta::seconds(3);
        sync.sync(&reg, cursor);
        assert!(!sync.frames().first().unwrap().collapsed);

        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(1);
        let observed = physics::collapse_state(&reg.quantum(id).unwrap(), 0.5, &mut rng);
        reg.observe(id, observed);
        sync.invalidate();
        assert!(sync.sync(&reg, cursor));
        assert!(sync.frames().first().unwrap().collapsed);
    }

    #[test]
    fn latest_frame_lands_on_handle() {
        let mut reg = ParticleRegistry::new();
        let bit = bit_at(0);
        let id = bit.id;
        reg.append(bit);
        let mut sync = RenderSync::new(HeadlessBackend::new());
        let cursor = base() + TimeDelta::seconds(1);
        sync.sync(&reg, cursor);
        let frame = sync.handle(id).unwrap().last_frame.clone().unwrap();
        assert!(frame.visible);
        assert!((frame.highlight_intensity - trajectory::FRESH_INTENSITY).abs() < f64::EPSILON);
    }

    #[test]
    fn dispose_releases_everything() {
        let mut reg = ParticleRegistry::new();
        reg.append(bit_at(0));
        reg.append(bit_at(1));
        let mut sync = RenderSync::new(HeadlessBackend::new());
        sync.sync(&reg, base());
        sync.dispose();
        assert_eq!(sync.handle_count(), 0);
        assert_eq!(sync.backend().destroyed(), 2);
        assert!(sync.needs_sync(base(), 2));
    }
}
