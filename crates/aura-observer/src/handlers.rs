//! REST endpoint handlers for reading engine state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/timeline` | Cursor, mode and observed bounds |
//! | `GET` | `/api/particles` | Per-particle frames at the cursor |
//! | `GET` | `/api/metrics` | Stability, coherence, entropy, resonance |
//! | `GET` | `/api/messages` | Chat log, oldest first |
//! | `GET` | `/api/spawn-vector` | Current spawn vector |
//! | `POST` | `/api/spawn-vector` | Set the spawn vector (clamped) |
//! | `POST` | `/api/spawn` | Birth a particle |

use std::sync::Arc;

use aura_types::Vec3;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the timeline, metrics and API links.
pub async fn index(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.engine.snapshot().await?;
    let mode = snapshot.timeline.mode;
    let cursor = snapshot.timeline.cursor_time.to_rfc3339();
    let particles = snapshot.frames.len();
    let visible = snapshot.frames.iter().filter(|f| f.visible).count();
    let stability = snapshot.metrics.stability;
    let coherence = snapshot.metrics.coherence;
    let entropy = snapshot.metrics.entropy;
    let resonance = snapshot.metrics.resonance;

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Aura Mirror</title>
    <style>
        body {{
            background: #05060a;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #22d3ee; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #0f1117;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #22d3ee; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #a855f7; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Aura Mirror</h1>
    <p>Timeline: <b>{mode:?}</b> at {cursor}</p>

    <div>
        <div class="metric"><div class="label">Particles</div><div class="value">{visible}/{particles}</div></div>
        <div class="metric"><div class="label">Stability</div><div class="value">{stability}</div></div>
        <div class="metric"><div class="label">Coherence</div><div class="value">{coherence}</div></div>
        <div class="metric"><div class="label">Entropy</div><div class="value">{entropy}</div></div>
        <div class="metric"><div class="label">Resonance</div><div class="value">{resonance} Hz</div></div>
    </div>

    <h2>API</h2>
    <ul>
        <li><a href="/api/timeline">/api/timeline</a></li>
        <li><a href="/api/particles">/api/particles</a></li>
        <li><a href="/api/metrics">/api/metrics</a></li>
        <li><a href="/api/messages">/api/messages</a></li>
        <li><a href="/api/spawn-vector">/api/spawn-vector</a></li>
        <li><a href="/api/updates">/api/updates</a></li>
        <li><code>ws://host:port/ws/frames</code></li>
    </ul>
</body>
</html>"#
    )))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Return the timeline state.
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.snapshot().await?.timeline))
}

/// Return every particle's frame at the current cursor.
pub async fn list_particles(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.snapshot().await?.frames))
}

/// Return the current metrics.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.snapshot().await?.metrics))
}

/// Return the chat log.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.messages().await?))
}

/// Return the spawn vector.
pub async fn get_spawn_vector(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.spawn_vector().await?))
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Set the spawn vector. Components are clamped to `[-100, 100]`; the
/// applied vector is returned.
pub async fn set_spawn_vector(
    State(state): State<Arc<AppState>>,
    Json(vector): Json<Vec3>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.set_spawn_vector(vector).await?))
}

/// Birth a particle at the spawn vector.
pub async fn spawn(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let bit = state.engine.spawn().await?;
    tracing::info!(id = %bit.id, kind = ?bit.kind, "Particle spawned by operator");
    Ok((StatusCode::CREATED, Json(bit)))
}
