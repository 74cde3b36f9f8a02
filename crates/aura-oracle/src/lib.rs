//! Completion and dream-image collaborator for the Aura cognitive mirror.
//!
//! Turns a [`TurnPlan`](aura_core::session::TurnPlan) into a reply with an
//! introspection block, and a dream prompt into an inline image. Failures
//! never propagate: they become fixed fallback replies.
//!
//! # Modules
//!
//! - [`backend`] -- [`Oracle`] dispatch, the Gemini HTTP backend, routing
//! - [`prompt`] -- `minijinja` system prompt rendering
//! - [`parse`] -- Splitting replies at the burst marker
//! - [`error`] -- Error types

pub mod backend;
pub mod error;
pub mod parse;
pub mod prompt;

pub use backend::{GeminiBackend, Oracle, ScriptedBackend, create_oracle};
pub use error::OracleError;
