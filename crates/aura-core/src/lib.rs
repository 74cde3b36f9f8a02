//! Chrono-positioning engine and session loop for the Aura cognitive mirror.
//!
//! Every particle's position is a pure function of its birth record and a
//! global cursor time, so the same store can be scrubbed backwards and
//! forwards without replaying history. This crate owns that evaluation,
//! the timeline controller that moves the cursor, the metrics derived from
//! population growth, and the single-task loop that serializes every
//! mutation.
//!
//! # Modules
//!
//! - [`classifier`] -- Keyword mode classifier and the bounded shadow context.
//! - [`commands`] -- [`Command`] queue and the typed [`EngineHandle`].
//! - [`config`] -- Configuration loading from `aura-config.yaml`.
//! - [`metrics`] -- Coherence, entropy and resonance derivation.
//! - [`outbox`] -- Fire-and-forget persistence writes.
//! - [`physics`] -- Particle properties, spawn velocities, quantum collapse.
//! - [`registry`] -- Append-only birth registry with the observation overlay.
//! - [`render_sync`] -- Incremental frame reconciliation over a backend.
//! - [`runner`] -- The `tokio::select!` engine loop.
//! - [`session`] -- [`MirrorSession`], the context owned by the loop.
//! - [`timeline`] -- Live/replay cursor with monotonic bounds.
//! - [`trajectory`] -- Position and freshness as functions of time.
//!
//! [`Command`]: commands::Command
//! [`EngineHandle`]: commands::EngineHandle
//! [`MirrorSession`]: session::MirrorSession

pub mod classifier;
pub mod commands;
pub mod config;
pub mod metrics;
pub mod outbox;
pub mod physics;
pub mod registry;
pub mod render_sync;
pub mod runner;
pub mod session;
pub mod timeline;
pub mod trajectory;
