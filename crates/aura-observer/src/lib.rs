//! Operator API server for the Aura cognitive mirror.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/frames`) streaming frame snapshots
//!   via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the timeline, particles, metrics and chat log
//! - **Operator endpoints** for spawning, scrubbing, stability and
//!   observation
//! - **Conversation endpoints** for chat turns and dream images
//! - **Release history** (`GET /api/updates`)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Every handler talks to the engine through its command queue
//! ([`EngineHandle`](aura_core::commands::EngineHandle)), so reads and
//! writes are serialized with the tick. Completion calls run on the
//! request task between two engine steps.

pub mod conversation;
pub mod error;
pub mod handlers;
pub mod operator;
pub mod releases;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_observer;
pub use state::AppState;
