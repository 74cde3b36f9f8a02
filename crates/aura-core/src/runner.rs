//! The engine loop.
//!
//! [`run_session`] drives a [`MirrorSession`] from a single task with
//! `tokio::select!` over four sources:
//!
//! - **Commands**: operator requests, applied in arrival order
//! - **Tick**: fixed period, advances the timeline (what time it is)
//! - **Refresh**: faster period, re-runs render sync (how often to repaint)
//! - **Shutdown**: external stop signal
//!
//! Tick and refresh are independent intervals, so repaint frequency never
//! affects timeline timing. After every step the session's outbox is
//! drained into the [`WriteDispatcher`].

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::commands::Command;
use crate::config::TimelineConfig;
use crate::outbox::WriteDispatcher;
use crate::render_sync::{HeadlessBackend, RenderSync};
use crate::session::{FrameSnapshot, MirrorSession};

/// Source of wall-clock time for the loop.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock anchored at a fixed instant that advances with the tokio
/// runtime's monotonic clock. Under `tokio::time::pause` it advances only
/// when the runtime does, which makes loop tests deterministic.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    anchor: DateTime<Utc>,
    started: Instant,
}

impl AnchoredClock {
    /// Anchor `anchor` to the runtime's current instant.
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.started.elapsed())
            .ok()
            .and_then(|elapsed| self.anchor.checked_add_signed(elapsed))
            .unwrap_or(self.anchor)
    }
}

/// Callback invoked whenever the render sync re-ran.
pub trait FrameCallback: Send {
    /// Called with the freshly evaluated snapshot.
    fn on_frame(&mut self, snapshot: &FrameSnapshot);
}

/// A no-op frame callback for testing.
pub struct NoOpCallback;

impl FrameCallback for NoOpCallback {
    fn on_frame(&mut self, _snapshot: &FrameSnapshot) {}
}

/// Loop periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Timeline tick period.
    pub tick_interval: Duration,
    /// Presentation refresh period.
    pub refresh_interval: Duration,
}

impl LoopConfig {
    /// Periods from the timeline configuration. Zero periods become 1ms.
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            refresh_interval: Duration::from_millis(config.refresh_interval_ms.max(1)),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEndReason {
    /// The shutdown signal fired.
    Shutdown,
    /// Every command sender was dropped.
    QueueClosed,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// Why the loop stopped.
    pub end_reason: LoopEndReason,
    /// Timeline ticks processed.
    pub ticks: u64,
    /// Render passes that produced a frame.
    pub frames: u64,
    /// Commands applied.
    pub commands: u64,
}

/// Run the engine loop until shutdown or until the queue closes.
///
/// # Arguments
///
/// * `session` - The owned session context
/// * `commands` - Receiver side of the command queue
/// * `config` - Tick and refresh periods
/// * `clock` - Wall-clock source
/// * `callback` - Called after every render pass that ran
/// * `dispatcher` - Receives drained persistence writes
/// * `shutdown` - Resolves when the loop should stop
pub async fn run_session(
    session: &mut MirrorSession,
    mut commands: mpsc::Receiver<Command>,
    config: LoopConfig,
    clock: &dyn Clock,
    callback: &mut dyn FrameCallback,
    dispatcher: &mut dyn WriteDispatcher,
    shutdown: impl Future<Output = ()>,
) -> LoopSummary {
    let mut tick = tokio::time::interval(config.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refresh = tokio::time::interval(config.refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut sync = RenderSync::with_fresh_window(HeadlessBackend::new(), session.fresh_window());
    let mut ticks: u64 = 0;
    let mut frames: u64 = 0;
    let mut applied: u64 = 0;

    info!(
        tick_ms = config.tick_interval.as_millis(),
        refresh_ms = config.refresh_interval.as_millis(),
        particles = session.registry().len(),
        "Engine loop starting"
    );

    tokio::pin!(shutdown);
    let end_reason = loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("Shutdown signal received");
                break LoopEndReason::Shutdown;
            }

            cmd = commands.recv() => {
                let Some(cmd) = cmd else {
                    info!("Command queue closed");
                    break LoopEndReason::QueueClosed;
                };
                if apply(session, cmd, clock.now()) {
                    sync.invalidate();
                }
                applied = applied.saturating_add(1);
            }

            _ = tick.tick() => {
                session.tick(clock.now());
                ticks = ticks.saturating_add(1);
            }

            _ = refresh.tick() => {
                if session.take_frames_dirty() {
                    sync.invalidate();
                }
                let cursor = session.timeline().cursor();
                if sync.sync(session.registry(), cursor) {
                    let snapshot = FrameSnapshot {
                        timeline: session.timeline().state(),
                        metrics: session.metrics(),
                        frames: sync.frames().to_vec(),
                    };
                    callback.on_frame(&snapshot);
                    frames = frames.saturating_add(1);
                }
            }
        }

        let writes = session.drain_outbox();
        if !writes.is_empty() {
            debug!(count = writes.len(), "Dispatching writes");
            dispatcher.dispatch(writes);
        }
    };

    sync.dispose();
    let writes = session.drain_outbox();
    if !writes.is_empty() {
        dispatcher.dispatch(writes);
    }

    info!(
        reason = ?end_reason,
        ticks,
        frames,
        commands = applied,
        "Engine loop stopped"
    );
    LoopSummary {
        end_reason,
        ticks,
        frames,
        commands: applied,
    }
}

/// Apply one command. Returns whether the visible state may have changed
/// without the cursor or population moving.
fn apply(session: &mut MirrorSession, cmd: Command, now: DateTime<Utc>) -> bool {
    // A dropped reply receiver only means the caller stopped waiting.
    match cmd {
        Command::Spawn { reply } => {
            let _ = reply.send(session.spawn(now));
            true
        }
        Command::SetSpawnVector { vector, reply } => {
            let _ = reply.send(session.set_spawn_vector(vector));
            false
        }
        Command::GetSpawnVector { reply } => {
            let _ = reply.send(session.spawn_vector());
            false
        }
        Command::ToggleTimeline { reply } => {
            let _ = reply.send(session.toggle_timeline());
            true
        }
        Command::Scrub { time, reply } => {
            let _ = reply.send(session.scrub(time));
            true
        }
        Command::Rewind { step, reply } => {
            let _ = reply.send(session.rewind(step));
            true
        }
        Command::ResumeLive { reply } => {
            let _ = reply.send(session.resume_live());
            true
        }
        Command::SetStability { stability, reply } => {
            let _ = reply.send(session.set_stability(stability));
            true
        }
        Command::Collapse { id, bias, reply } => {
            let _ = reply.send(session.collapse(id, bias, now));
            true
        }
        Command::BeginTurn {
            text,
            workspace,
            reply,
        } => {
            let _ = reply.send(session.begin_turn(&text, workspace, now));
            true
        }
        Command::CompleteTurn {
            plan,
            completion,
            reply,
        } => {
            let _ = reply.send(session.complete_turn(&plan, completion, now));
            true
        }
        Command::BeginDream { prompt, reply } => {
            let _ = reply.send(session.begin_dream(&prompt, now));
            false
        }
        Command::CompleteDream { image, reply } => {
            let _ = reply.send(session.complete_dream(image, now));
            false
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
            false
        }
        Command::Messages { reply } => {
            let _ = reply.send(session.messages().to_vec());
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aura_types::{RecordKind, TimelineMode, Workspace};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::commands::EngineHandle;
    use crate::outbox::CollectWrites;
    use crate::session::SessionSettings;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_716_700_000_000).unwrap()
    }

    fn session() -> MirrorSession {
        MirrorSession::new(SessionSettings::default(), t0()).with_rng(StdRng::seed_from_u64(1))
    }

    #[derive(Default)]
    struct Recorder {
        snapshots: Vec<FrameSnapshot>,
    }

    impl FrameCallback for Recorder {
        fn on_frame(&mut self, snapshot: &FrameSnapshot) {
            self.snapshots.push(snapshot.clone());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_advance_timeline_while_live() {
        let mut s = session();
        let clock = AnchoredClock::new(t0());
        let (handle, rx) = EngineHandle::channel(8);
        let mut cb = Recorder::default();
        let mut sink = CollectWrites::default();

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(450)).await;
            let snap = handle.snapshot().await.unwrap();
            drop(handle);
            snap
        };
        let run = run_session(
            &mut s,
            rx,
            LoopConfig::default(),
            &clock,
            &mut cb,
            &mut sink,
            std::future::pending(),
        );
        let (summary, snap) = tokio::join!(run, driver);

        assert_eq!(summary.end_reason, LoopEndReason::QueueClosed);
        assert!(summary.ticks >= 4, "ticks = {}", summary.ticks);
        assert_eq!(snap.timeline.mode, TimelineMode::Live);
        assert_eq!(snap.timeline.cursor_time, snap.timeline.max_observed_time);
        assert!(snap.timeline.max_observed_time >= t0() + TimeDelta::milliseconds(400));
        assert!(!cb.snapshots.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_is_persisted_and_rendered() {
        let mut s = session();
        let clock = AnchoredClock::new(t0());
        let (handle, rx) = EngineHandle::channel(8);
        let mut cb = Recorder::default();
        let mut sink = CollectWrites::default();

        let driver = async move {
            let bit = handle.spawn().await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            bit
        };
        let run = run_session(
            &mut s,
            rx,
            LoopConfig::default(),
            &clock,
            &mut cb,
            &mut sink,
            std::future::pending(),
        );
        let (_, bit) = tokio::join!(run, driver);

        assert_eq!(sink.of_kind(RecordKind::Particles).count(), 1);
        let last = cb.snapshots.last().unwrap();
        let frame = last.frames.iter().find(|f| f.id == bit.id).unwrap();
        assert!(frame.visible);
        assert_eq!(s.registry().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replay_cursor_holds_across_ticks() {
        let mut s = session();
        let clock = AnchoredClock::new(t0());
        let (handle, rx) = EngineHandle::channel(8);
        let mut cb = NoOpCallback;
        let mut sink = CollectWrites::default();

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let frozen = handle.scrub(t0() + TimeDelta::milliseconds(100)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            let later = handle.snapshot().await.unwrap().timeline;
            let live = handle.resume_live().await.unwrap();
            (frozen, later, live)
        };
        let run = run_session(
            &mut s,
            rx,
            LoopConfig::default(),
            &clock,
            &mut cb,
            &mut sink,
            std::future::pending(),
        );
        let (_, (frozen, later, live)) = tokio::join!(run, driver);

        assert_eq!(frozen.mode, TimelineMode::Replay);
        assert_eq!(later.cursor_time, frozen.cursor_time);
        assert!(later.max_observed_time > frozen.max_observed_time);
        assert_eq!(live.cursor_time, live.max_observed_time);
    }

    #[tokio::test(start_paused = true)]
    async fn chat_turn_through_queue() {
        let mut s = session();
        let clock = AnchoredClock::new(t0());
        let (handle, rx) = EngineHandle::channel(8);
        let mut cb = NoOpCallback;
        let mut sink = CollectWrites::default();

        let driver = async move {
            let plan = handle
                .begin_turn("make a bit".to_owned(), Workspace::Mirror)
                .await
                .unwrap();
            let completion = aura_types::Completion {
                text: "ok".to_owned(),
                introspection: "calm".to_owned(),
            };
            handle.complete_turn(plan, completion).await.unwrap()
        };
        let run = run_session(
            &mut s,
            rx,
            LoopConfig::default(),
            &clock,
            &mut cb,
            &mut sink,
            std::future::pending(),
        );
        let (_, outcome) = tokio::join!(run, driver);

        assert!(outcome.spawned.is_some());
        assert_eq!(sink.of_kind(RecordKind::ChatMessages).count(), 2);
        assert_eq!(sink.of_kind(RecordKind::AuditLog).count(), 1);
        assert_eq!(sink.of_kind(RecordKind::Particles).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_stops_loop() {
        let mut s = session();
        let clock = AnchoredClock::new(t0());
        let (_handle, rx) = EngineHandle::channel(8);
        let mut cb = NoOpCallback;
        let mut sink = CollectWrites::default();

        let summary = run_session(
            &mut s,
            rx,
            LoopConfig::default(),
            &clock,
            &mut cb,
            &mut sink,
            tokio::time::sleep(Duration::from_millis(1_000)),
        )
        .await;

        assert_eq!(summary.end_reason, LoopEndReason::Shutdown);
        assert!(summary.ticks >= 10);
        assert_eq!(summary.commands, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_skips_when_nothing_moves() {
        let mut s = session();
        let clock = AnchoredClock::new(t0());
        let (handle, rx) = EngineHandle::channel(8);
        let mut cb = Recorder::default();
        let mut sink = CollectWrites::default();

        let driver = async move {
            // Freeze the cursor, then let many refresh periods pass.
            let _ = handle.toggle_timeline().await;
            tokio::time::sleep(Duration::from_millis(1_000)).await;
        };
        let run = run_session(
            &mut s,
            rx,
            LoopConfig::default(),
            &clock,
            &mut cb,
            &mut sink,
            std::future::pending(),
        );
        let (summary, ()) = tokio::join!(run, driver);

        // ~60 refresh periods elapsed, but a frozen cursor over an
        // unchanged population yields only a handful of frames.
        assert!(summary.frames < 5, "frames = {}", summary.frames);
    }
}
