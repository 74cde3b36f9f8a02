//! Axum router construction for the operator API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin presentation clients.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{conversation, handlers, operator, releases, ws};

/// Build the complete Axum router.
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/frames", get(ws::ws_frames))
        // Reads and spawning
        .route("/api/timeline", get(handlers::get_timeline))
        .route("/api/particles", get(handlers::list_particles))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/messages", get(handlers::list_messages))
        .route(
            "/api/spawn-vector",
            get(handlers::get_spawn_vector).post(handlers::set_spawn_vector),
        )
        .route("/api/spawn", post(handlers::spawn))
        .route("/api/updates", get(releases::list_updates))
        // Operator control
        .route("/api/timeline/toggle", post(operator::toggle_timeline))
        .route("/api/timeline/scrub", post(operator::scrub))
        .route("/api/timeline/rewind", post(operator::rewind))
        .route("/api/timeline/live", post(operator::resume_live))
        .route("/api/metrics/stability", post(operator::set_stability))
        .route("/api/particles/{id}/collapse", post(operator::collapse))
        // Conversation
        .route("/api/chat", post(conversation::chat))
        .route("/api/dream", post(conversation::dream))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
