//! Core record structs for the Aura cognitive mirror.
//!
//! [`HyperBit`] is the birth record at the heart of the chrono-positioning
//! engine. It is immutable once created: its birth timestamp defines its
//! entire temporal existence, and every random parameter is sampled exactly
//! once at birth and stored here so replay is deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    CognitiveMode, Freshness, MessageRole, ParticleKind, TimelineMode, UpdateStatus,
};
use crate::ids::{GenesisId, HyperBitId, MessageId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point or vector in 3D world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// Static physical attributes of a particle kind (SI units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PhysicalProperties {
    /// Rest mass in kilograms.
    pub mass: f64,
    /// Electric charge in coulombs.
    pub charge: f64,
    /// Spin quantum number.
    pub spin: f64,
}

/// Two-outcome quantum state of a particle.
///
/// The squared amplitudes sum to 1. `observed_value` is `None` until the
/// state collapses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuantumState {
    /// Probability amplitude for outcome `|0>`.
    pub amplitude0: f64,
    /// Probability amplitude for outcome `|1>`.
    pub amplitude1: f64,
    /// Whether the state has been observed.
    pub collapsed: bool,
    /// The observed outcome (0 or 1), once collapsed.
    pub observed_value: Option<u8>,
}

/// Immutable birth record of a particle (a "`HyperBit`").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HyperBit {
    /// Unique identifier.
    pub id: HyperBitId,
    /// Particle category.
    pub kind: ParticleKind,
    /// Physical attributes looked up from the kind table at birth.
    pub physics: PhysicalProperties,
    /// Quantum state sampled at birth.
    pub quantum: QuantumState,
    /// Initial position (the spawn vector at creation).
    pub position: Vec3,
    /// Per-axis drift/oscillation coefficients.
    pub velocity: Vec3,
    /// Wall-clock instant of creation. Never changes.
    pub timestamp: DateTime<Utc>,
}

/// Presentation result for one particle at the current cursor time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParticleFrame {
    /// The particle this frame describes.
    pub id: HyperBitId,
    /// Whether the particle exists at the cursor time.
    pub visible: bool,
    /// World-space position, present only when visible.
    pub position: Option<Vec3>,
    /// Emissive intensity for the presentation layer.
    pub highlight_intensity: f64,
    /// Recently-born vs settled.
    pub freshness: Freshness,
    /// Whether the particle's quantum state has been observed.
    pub collapsed: bool,
}

// ---------------------------------------------------------------------------
// Timeline and metrics
// ---------------------------------------------------------------------------

/// Observable state of the timeline controller (for a scrub bar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineState {
    /// The instant currently being visualized.
    pub cursor_time: DateTime<Utc>,
    /// Live or replay.
    pub mode: TimelineMode,
    /// Earliest renderable instant.
    pub min_observed_time: DateTime<Utc>,
    /// Latest renderable instant (monotonically non-decreasing).
    pub max_observed_time: DateTime<Utc>,
}

impl TimelineState {
    /// Whether the cursor is tracking real time.
    pub fn is_live(&self) -> bool {
        self.mode == TimelineMode::Live
    }
}

/// Derived scalar system metrics (not authoritative state).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemMetrics {
    /// Operator/ambient-set stability in `[0, 1]`.
    pub stability: f64,
    /// Entropy derived from coherence.
    pub entropy: f64,
    /// Decaying coherence in `[0, 1]`.
    pub coherence: f64,
    /// Nominal dimensionality of the mirror.
    pub dimension: u32,
    /// Synaptic resonance in Hz.
    pub resonance: f64,
}

// ---------------------------------------------------------------------------
// Conversation and audit
// ---------------------------------------------------------------------------

/// A chat message, persisted under the `chat-messages` kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatMessage {
    /// Unique identifier.
    pub id: MessageId,
    /// Author.
    pub role: MessageRole,
    /// Message body.
    pub text: String,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
    /// The completion service's self-reported reasoning, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection: Option<String>,
    /// Inline image payload (`data:` URI), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    /// Mode the message was generated in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<CognitiveMode>,
}

/// An audit-log entry, persisted under the `audit-log` kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenesisEntry {
    /// Unique identifier.
    pub id: GenesisId,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
    /// Action tag, e.g. `CHAT_TURN`.
    pub action_type: String,
    /// Free-form metadata.
    pub metadata: serde_json::Value,
}

/// Reply produced by the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Completion {
    /// The main reply text.
    pub text: String,
    /// The reply's introspection block.
    pub introspection: String,
}

/// One entry of the system's release history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemUpdate {
    /// Version label, e.g. `v2.3`.
    pub version: String,
    /// Release day, `YYYY-MM-DD`.
    pub date: String,
    /// Headline.
    pub title: String,
    /// One-sentence summary.
    pub description: String,
    /// Delivery state.
    pub status: UpdateStatus,
    /// Notable features, in presentation order.
    pub features: Vec<String>,
}
