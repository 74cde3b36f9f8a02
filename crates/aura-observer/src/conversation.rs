//! Chat and dream handlers.
//!
//! A chat turn is recorded in two engine steps around the completion call:
//! `BeginTurn` records the user message and returns the plan, the oracle
//! is awaited on the request task, then `CompleteTurn` records the reply.
//! The engine loop keeps ticking while the oracle is in flight.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Send a message, receive the reply |
//! | `POST` | `/api/dream` | Render a prompt as an image |

use std::sync::Arc;

use aura_types::{ChatMessage, CognitiveMode, HyperBit, MessageId, Workspace};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
    /// The user's text.
    pub text: String,
    /// Workspace the text was sent from.
    #[serde(default)]
    pub workspace: Workspace,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, serde::Serialize)]
pub struct ChatResponse {
    /// Id of the recorded user message.
    pub user_message_id: MessageId,
    /// Detected mode.
    pub mode: CognitiveMode,
    /// The recorded reply.
    pub reply: ChatMessage,
    /// A particle spawned by a keyword in the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawned: Option<HyperBit>,
    /// Prompt the reply suggested visualising.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dream_suggestion: Option<String>,
}

/// Request body for `POST /api/dream`.
#[derive(Debug, serde::Deserialize)]
pub struct DreamRequest {
    /// What to visualise.
    pub prompt: String,
}

/// Response body for `POST /api/dream`.
#[derive(Debug, serde::Serialize)]
pub struct DreamResponse {
    /// The recorded message carrying the image, when one was produced.
    pub message: Option<ChatMessage>,
}

/// Run a chat turn.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let plan = state.engine.begin_turn(req.text, req.workspace).await?;
    let completion = state.oracle.respond(&plan).await;

    let user_message_id = plan.user_message_id;
    let mode = plan.mode;
    let outcome = state.engine.complete_turn(plan, completion).await?;

    Ok(Json(ChatResponse {
        user_message_id,
        mode,
        reply: outcome.message,
        spawned: outcome.spawned,
        dream_suggestion: outcome.dream_suggestion,
    }))
}

/// Render a dream image. Nothing is recorded in the chat log when the
/// oracle produces no image.
pub async fn dream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DreamRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    state.engine.begin_dream(req.prompt.clone()).await?;
    let image = state.oracle.dream(&req.prompt).await;
    if image.is_none() {
        tracing::info!(oracle = state.oracle.name(), "Dream produced no image");
    }
    let message = state.engine.complete_dream(image).await?;
    Ok(Json(DreamResponse { message }))
}
