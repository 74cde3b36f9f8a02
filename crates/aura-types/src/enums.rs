//! Enumeration types for the Aura cognitive mirror.
//!
//! Particle categories, chat roles, cognitive modes, timeline modes and the
//! record kinds understood by the persistence collaborator.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// Category of a `HyperBit` particle.
///
/// Each kind has static physical attributes (mass, charge, spin) looked up
/// from a constant table in `aura-core`. The kind is purely descriptive and
/// never enters the trajectory math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ParticleKind {
    /// Electron.
    Electron,
    /// Proton.
    Proton,
    /// Neutron.
    Neutron,
    /// Photon.
    Photon,
    /// Higgs boson.
    Higgs,
}

impl ParticleKind {
    /// Every particle kind, in table order.
    pub const ALL: [Self; 5] = [
        Self::Electron,
        Self::Proton,
        Self::Neutron,
        Self::Photon,
        Self::Higgs,
    ];
}

/// Presentation freshness of a particle at a given query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Freshness {
    /// Born less than the fresh window ago (highlighted).
    RecentlyBorn,
    /// Older than the fresh window, or exactly at its birth instant.
    Settled,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// The two states of the timeline controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimelineMode {
    /// The cursor tracks wall-clock "now" on every tick.
    Live,
    /// The cursor is frozen at an operator-chosen instant.
    Replay,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum MessageRole {
    /// Produced by the completion service (or the system greeting).
    Ai,
    /// Typed or dictated by the operator.
    User,
}

/// Dominant cognitive mode of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum CognitiveMode {
    /// Precise, factual, structured.
    Analytic,
    /// Free-form creative.
    Creative,
    /// Imagery suitable for visualisation.
    Dream,
    /// Soft, mirroring tone.
    Empathic,
    /// Code refactoring and review.
    Alchemy,
}

impl CognitiveMode {
    /// Upper-case wire name, as used in prompts and audit metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analytic => "ANALYTIC",
            Self::Creative => "CREATIVE",
            Self::Dream => "DREAM",
            Self::Empathic => "EMPATHIC",
            Self::Alchemy => "ALCHEMY",
        }
    }
}

impl core::fmt::Display for CognitiveMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotional footprint recorded in the shadow context for each user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Sentiment {
    /// No notable emotional signal.
    Neutral,
    /// The operator is sharing feelings.
    EmotionalVulnerability,
    /// The operator is focused on technical work.
    TechnicalFocus,
}

impl Sentiment {
    /// Upper-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::EmotionalVulnerability => "EMOTIONAL_VULNERABILITY",
            Self::TechnicalFocus => "TECHNICAL_FOCUS",
        }
    }
}

/// The operator-facing workspace tab the message was sent from.
///
/// The Alchemy and Dream workspaces force their respective modes regardless
/// of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Workspace {
    /// Cognitive mirror (default).
    #[default]
    Mirror,
    /// Code forge.
    Alchemy,
    /// Timeline history.
    History,
    /// Dream studio.
    Dream,
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Record collections known to the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum RecordKind {
    /// `HyperBit` birth records.
    Particles,
    /// Chat messages.
    ChatMessages,
    /// Genesis audit entries.
    AuditLog,
}

impl RecordKind {
    /// Every record kind.
    pub const ALL: [Self; 3] = [Self::Particles, Self::ChatMessages, Self::AuditLog];

    /// Stable collection name used as a key segment by the stores.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Particles => "particles",
            Self::ChatMessages => "chat-messages",
            Self::AuditLog => "audit-log",
        }
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Release history
// ---------------------------------------------------------------------------

/// Delivery state of a release-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum UpdateStatus {
    /// Shipped.
    Completed,
    /// Under way.
    InProgress,
    /// Not started.
    Planned,
}
