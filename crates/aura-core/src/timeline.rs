//! Live/replay timeline controller.
//!
//! The controller owns the query-time cursor and the observable window
//! `[min, max]`. It is the only component that advances time; everything
//! downstream is a pure function of the cursor and the registry.
//!
//! # Design Principles
//!
//! - `min <= cursor <= max` holds after every operation.
//! - `max` never decreases, even if the wall clock steps backwards.
//! - Wall-clock time is always passed in, never read here, so every
//!   transition is reproducible in tests.
//! - Out-of-range requests are clamped, never rejected.

use aura_types::{TimelineMode, TimelineState};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// Two-state (live/replay) cursor over the observed time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineController {
    cursor: DateTime<Utc>,
    mode: TimelineMode,
    min: DateTime<Utc>,
    max: DateTime<Utc>,
}

impl TimelineController {
    /// Start live at `now`.
    ///
    /// The window opens at the earliest known record timestamp, or at
    /// `now` when there is no history.
    pub fn new(now: DateTime<Utc>, earliest_known: Option<DateTime<Utc>>) -> Self {
        let min = earliest_known.map_or(now, |earliest| earliest.min(now));
        Self {
            cursor: now,
            mode: TimelineMode::Live,
            min,
            max: now,
        }
    }

    /// Fixed-period tick: extend `max` to `now` and, while live, follow it.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if now > self.max {
            self.max = now;
        }
        if self.is_live() {
            self.cursor = self.max;
        }
    }

    /// Manual scrub to an absolute instant. Always enters replay.
    ///
    /// Returns the clamped cursor.
    pub fn scrub(&mut self, requested: DateTime<Utc>) -> DateTime<Utc> {
        self.mode = TimelineMode::Replay;
        self.cursor = requested.clamp(self.min, self.max);
        debug!(cursor = %self.cursor, "Timeline scrubbed");
        self.cursor
    }

    /// Step the cursor back by `step`, entering or staying in replay.
    ///
    /// Negative steps are treated as zero.
    pub fn rewind(&mut self, step: TimeDelta) -> DateTime<Utc> {
        self.mode = TimelineMode::Replay;
        let step = step.max(TimeDelta::zero());
        let target = self.cursor.checked_sub_signed(step).unwrap_or(self.min);
        self.cursor = target.clamp(self.min, self.max);
        debug!(cursor = %self.cursor, step_ms = step.num_milliseconds(), "Timeline rewound");
        self.cursor
    }

    /// Return to live: the cursor snaps to `max` and resumes tracking.
    pub fn resume_live(&mut self) {
        self.mode = TimelineMode::Live;
        self.cursor = self.max;
        debug!(cursor = %self.cursor, "Timeline resumed live");
    }

    /// Flip between live and replay. Entering replay freezes the cursor
    /// where it is. Returns the new mode.
    pub fn toggle(&mut self) -> TimelineMode {
        match self.mode {
            TimelineMode::Live => {
                self.mode = TimelineMode::Replay;
                debug!(cursor = %self.cursor, "Timeline paused");
            }
            TimelineMode::Replay => self.resume_live(),
        }
        self.mode
    }

    /// Widen the window for a newly known record timestamp.
    ///
    /// Older history pulls `min` down. A birth later than `max` (a spawn
    /// between ticks) pushes `max` up, and a live cursor follows it so the
    /// particle is visible immediately.
    pub fn observe_birth(&mut self, timestamp: DateTime<Utc>) {
        if timestamp < self.min {
            self.min = timestamp;
        }
        if timestamp > self.max {
            self.max = timestamp;
            if self.is_live() {
                self.cursor = self.max;
            }
        }
    }

    /// Whether the cursor is tracking real time.
    pub const fn is_live(&self) -> bool {
        matches!(self.mode, TimelineMode::Live)
    }

    /// Current mode.
    pub const fn mode(&self) -> TimelineMode {
        self.mode
    }

    /// The instant being visualized.
    pub const fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    /// Earliest renderable instant.
    pub const fn min_observed(&self) -> DateTime<Utc> {
        self.min
    }

    /// Latest renderable instant.
    pub const fn max_observed(&self) -> DateTime<Utc> {
        self.max
    }

    /// Snapshot for the scrub bar.
    pub const fn state(&self) -> TimelineState {
        TimelineState {
            cursor_time: self.cursor,
            mode: self.mode,
            min_observed_time: self.min,
            max_observed_time: self.max,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_716_700_000_000).unwrap()
    }

    fn ms(n: i64) -> TimeDelta {
        TimeDelta::milliseconds(n)
    }

    fn assert_bounds(tl: &TimelineController) {
        assert!(tl.min_observed() <= tl.cursor(), "cursor below min");
        assert!(tl.cursor() <= tl.max_observed(), "cursor above max");
    }

    #[test]
    fn starts_live_at_now() {
        let tl = TimelineController::new(t0(), None);
        assert!(tl.is_live());
        assert_eq!(tl.cursor(), t0());
        assert_eq!(tl.min_observed(), t0());
        assert_eq!(tl.max_observed(), t0());
    }

    #[test]
    fn history_opens_window_earlier() {
        let tl = TimelineController::new(t0(), Some(t0() - ms(60_000)));
        assert_eq!(tl.min_observed(), t0() - ms(60_000));
        assert_eq!(tl.cursor(), t0());
    }

    #[test]
    fn future_history_does_not_invert_window() {
        let tl = TimelineController::new(t0(), Some(t0() + ms(5_000)));
        assert_eq!(tl.min_observed(), t0());
        assert_bounds(&tl);
    }

    #[test]
    fn scrub_clamps_to_window() {
        let mut tl = TimelineController::new(t0(), None);
        tl.tick(t0() + ms(5000));

        assert_eq!(tl.scrub(t0() - ms(1000)), t0());
        assert_eq!(tl.scrub(t0() + ms(9000)), t0() + ms(5000));
        assert_eq!(tl.scrub(t0() + ms(2500)), t0() + ms(2500));
        assert!(!tl.is_live());
    }

    #[test]
    fn scrub_freezes_then_resume_tracks() {
        let mut tl = TimelineController::new(t0(), None);
        tl.tick(t0() + ms(3000));
        tl.scrub(t0() + ms(1000));
        assert_eq!(tl.mode(), TimelineMode::Replay);

        for step in 1..=5 {
            tl.tick(t0() + ms(3000 + step * 100));
            assert_eq!(tl.cursor(), t0() + ms(1000));
        }
        assert_eq!(tl.max_observed(), t0() + ms(3500));

        tl.resume_live();
        assert_eq!(tl.cursor(), tl.max_observed());
        for step in 1..=5 {
            tl.tick(t0() + ms(3500 + step * 100));
            assert_eq!(tl.cursor(), tl.max_observed());
        }
    }

    #[test]
    fn max_never_decreases_on_clock_step_back() {
        let mut tl = TimelineController::new(t0(), None);
        tl.tick(t0() + ms(1000));
        tl.tick(t0() + ms(400));
        assert_eq!(tl.max_observed(), t0() + ms(1000));
        assert_eq!(tl.cursor(), t0() + ms(1000));
    }

    #[test]
    fn rewind_steps_back_and_stops_at_min() {
        let mut tl = TimelineController::new(t0(), None);
        tl.tick(t0() + ms(25_000));
        assert_eq!(tl.rewind(ms(10_000)), t0() + ms(15_000));
        assert!(!tl.is_live());
        assert_eq!(tl.rewind(ms(10_000)), t0() + ms(5_000));
        assert_eq!(tl.rewind(ms(10_000)), t0());
        assert_eq!(tl.rewind(ms(10_000)), t0());
    }

    #[test]
    fn negative_rewind_is_a_no_op_step() {
        let mut tl = TimelineController::new(t0(), None);
        tl.tick(t0() + ms(1000));
        assert_eq!(tl.rewind(ms(-5000)), t0() + ms(1000));
    }

    #[test]
    fn toggle_round_trip() {
        let mut tl = TimelineController::new(t0(), None);
        assert_eq!(tl.toggle(), TimelineMode::Replay);
        tl.tick(t0() + ms(700));
        assert_eq!(tl.cursor(), t0());
        assert_eq!(tl.toggle(), TimelineMode::Live);
        assert_eq!(tl.cursor(), t0() + ms(700));
    }

    #[test]
    fn older_birth_widens_min() {
        let mut tl = TimelineController::new(t0(), None);
        tl.observe_birth(t0() - ms(42_000));
        assert_eq!(tl.min_observed(), t0() - ms(42_000));
        assert_eq!(tl.cursor(), t0());
    }

    #[test]
    fn birth_between_ticks_is_visible_live() {
        let mut tl = TimelineController::new(t0(), None);
        tl.observe_birth(t0() + ms(30));
        assert_eq!(tl.max_observed(), t0() + ms(30));
        assert_eq!(tl.cursor(), t0() + ms(30));
    }

    #[test]
    fn birth_between_ticks_does_not_move_replay_cursor() {
        let mut tl = TimelineController::new(t0(), None);
        tl.toggle();
        tl.observe_birth(t0() + ms(30));
        assert_eq!(tl.cursor(), t0());
        assert_eq!(tl.max_observed(), t0() + ms(30));
    }

    #[test]
    fn invariants_hold_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut now = t0();
        let mut tl = TimelineController::new(now, Some(t0() - ms(10_000)));
        let mut last_max = tl.max_observed();

        for _ in 0..5_000 {
            match rng.random_range(0..7_u8) {
                0 | 1 => {
                    now += ms(rng.random_range(-50..200));
                    tl.tick(now);
                    if tl.is_live() {
                        assert_eq!(tl.cursor(), tl.max_observed());
                    }
                }
                2 => {
                    let offset = rng.random_range(-60_000..60_000);
                    tl.scrub(t0() + ms(offset));
                    assert!(!tl.is_live());
                }
                3 => {
                    tl.rewind(ms(rng.random_range(0..20_000)));
                    assert!(!tl.is_live());
                }
                4 => {
                    tl.resume_live();
                    assert_eq!(tl.cursor(), tl.max_observed());
                }
                5 => {
                    tl.toggle();
                }
                _ => {
                    let offset = rng.random_range(-30_000..1_000);
                    tl.observe_birth(now + ms(offset));
                }
            }
            assert_bounds(&tl);
            assert!(tl.max_observed() >= last_max);
            last_max = tl.max_observed();
        }
    }

    #[test]
    fn state_snapshot_matches_accessors() {
        let mut tl = TimelineController::new(t0(), None);
        tl.tick(t0() + ms(100));
        let state = tl.state();
        assert_eq!(state.cursor_time, tl.cursor());
        assert_eq!(state.min_observed_time, tl.min_observed());
        assert_eq!(state.max_observed_time, tl.max_observed());
        assert!(state.is_live());
    }
}
