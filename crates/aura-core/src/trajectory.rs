//! Trajectory function: where a particle is at an arbitrary query time.
//!
//! Each particle's path is an independent closed-form function of the time
//! elapsed since its birth. There is no integration state, so replaying any
//! instant always yields the same position bit for bit.
//!
//! Per axis `a`:
//!
//! ```text
//! pos[a] = initial[a] + 10 * trig_a(age * velocity[a]) + 2 * age * velocity[a]
//! ```
//!
//! where `trig` is sine for x and z and cosine for y, and `age` is in
//! seconds. The oscillation is bounded; the drift term is not. Querying
//! before the birth timestamp yields `None`.

use aura_types::{Freshness, HyperBit, Vec3};
use chrono::{DateTime, TimeDelta, Utc};

/// Amplitude of the bounded oscillation term.
pub const OSCILLATION_AMPLITUDE: f64 = 10.0;

/// Scale of the linear drift term.
pub const DRIFT_FACTOR: f64 = 2.0;

/// Highlight intensity for recently born particles.
pub const FRESH_INTENSITY: f64 = 3.0;

/// Highlight intensity for settled particles.
pub const SETTLED_INTENSITY: f64 = 1.0;

/// Default window during which a particle counts as recently born.
pub const DEFAULT_FRESH_WINDOW: TimeDelta = TimeDelta::milliseconds(2000);

/// Result of evaluating one particle at one query time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Position, or `None` when the particle is not yet born.
    pub position: Option<Vec3>,
    /// Freshness at the query time.
    pub freshness: Freshness,
}

impl Evaluation {
    /// Whether the particle exists at the query time.
    pub const fn is_visible(&self) -> bool {
        self.position.is_some()
    }

    /// Emissive intensity for the presentation layer. Zero when invisible.
    pub const fn highlight_intensity(&self) -> f64 {
        match (self.position, self.freshness) {
            (None, _) => 0.0,
            (Some(_), Freshness::RecentlyBorn) => FRESH_INTENSITY,
            (Some(_), Freshness::Settled) => SETTLED_INTENSITY,
        }
    }
}

/// Signed time since birth, in fractional seconds.
///
/// Microsecond resolution keeps sub-frame animation smooth.
#[allow(clippy::cast_precision_loss)]
pub fn age_seconds(bit: &HyperBit, query_time: DateTime<Utc>) -> f64 {
    let delta = query_time.signed_duration_since(bit.timestamp);
    delta.num_microseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1_000.0,
        |micros| micros as f64 / 1_000_000.0,
    )
}

/// Position of `bit` at `query_time`, or `None` before its birth.
pub fn position_at(bit: &HyperBit, query_time: DateTime<Utc>) -> Option<Vec3> {
    if query_time < bit.timestamp {
        return None;
    }
    let age = age_seconds(bit, query_time);
    let v = bit.velocity;
    Some(Vec3 {
        x: bit.position.x + OSCILLATION_AMPLITUDE * (age * v.x).sin() + DRIFT_FACTOR * age * v.x,
        y: bit.position.y + OSCILLATION_AMPLITUDE * (age * v.y).cos() + DRIFT_FACTOR * age * v.y,
        z: bit.position.z + OSCILLATION_AMPLITUDE * (age * v.z).sin() + DRIFT_FACTOR * age * v.z,
    })
}

/// Freshness of `bit` at `query_time` for a given window.
///
/// Recently born iff `0 < age < window`; the birth instant itself and
/// anything before it count as settled.
pub fn freshness(bit: &HyperBit, query_time: DateTime<Utc>, window: TimeDelta) -> Freshness {
    let age = query_time.signed_duration_since(bit.timestamp);
    if age > TimeDelta::zero() && age < window {
        Freshness::RecentlyBorn
    } else {
        Freshness::Settled
    }
}

/// Evaluate position and freshness together. Never cached.
pub fn evaluate(bit: &HyperBit, query_time: DateTime<Utc>, window: TimeDelta) -> Evaluation {
    Evaluation {
        position: position_at(bit, query_time),
        freshness: freshness(bit, query_time, window),
    }
}
