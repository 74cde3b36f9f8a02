//! Shared type definitions for the Aura cognitive mirror.
//!
//! This crate is the single source of truth for the data model shared by
//! the chrono-positioning engine, the persistence and completion
//! collaborators, and the operator API. Types flow downstream to
//! `TypeScript` via `ts-rs` for the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for record identifiers
//! - [`enums`] -- Particle kinds, chat roles, cognitive and timeline modes
//!   and release status
//! - [`structs`] -- Birth records, frames, metrics, chat and audit records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    CognitiveMode, Freshness, MessageRole, ParticleKind, RecordKind, Sentiment, TimelineMode,
    UpdateStatus, Workspace,
};
pub use ids::{GenesisId, HyperBitId, MessageId};
pub use structs::{
    ChatMessage, Completion, GenesisEntry, HyperBit, ParticleFrame, PhysicalProperties,
    QuantumState, SystemMetrics, SystemUpdate, TimelineState, Vec3,
};
