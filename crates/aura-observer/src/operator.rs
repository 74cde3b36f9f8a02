//! Operator REST handlers for the timeline, stability and observation.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/timeline/toggle` | Flip live/replay |
//! | `POST` | `/api/timeline/scrub` | Move the cursor to an instant |
//! | `POST` | `/api/timeline/rewind` | Step the cursor back |
//! | `POST` | `/api/timeline/live` | Return to live |
//! | `POST` | `/api/metrics/stability` | Set stability |
//! | `POST` | `/api/particles/{id}/collapse` | Observe a particle |

use std::sync::Arc;

use aura_types::HyperBitId;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ObserverError;
use crate::state::AppState;

/// Default collapse bias.
const DEFAULT_BIAS: f64 = 0.5;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// An instant given as RFC 3339 text or epoch milliseconds.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// RFC 3339 timestamp.
    Rfc3339(DateTime<Utc>),
}

impl TimeInput {
    /// The instant, or `None` when epoch milliseconds are out of range.
    pub fn resolve(self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(ms) => DateTime::<Utc>::from_timestamp_millis(ms),
            Self::Rfc3339(t) => Some(t),
        }
    }
}

/// Request body for `POST /api/timeline/scrub`.
#[derive(Debug, serde::Deserialize)]
pub struct ScrubRequest {
    /// Target instant (clamped to the observed bounds).
    pub time: TimeInput,
}

/// Request body for `POST /api/timeline/rewind`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RewindRequest {
    /// Step in milliseconds; the configured default when absent.
    pub step_ms: Option<i64>,
}

/// Request body for `POST /api/metrics/stability`.
#[derive(Debug, serde::Deserialize)]
pub struct StabilityRequest {
    /// New stability (clamped to `[0, 1]`).
    pub stability: f64,
}

/// Request body for `POST /api/particles/{id}/collapse`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct CollapseRequest {
    /// Bias toward outcome 1, default 0.5.
    pub bias: Option<f64>,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Flip between live and replay.
pub async fn toggle_timeline(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let timeline = state.engine.toggle_timeline().await?;
    tracing::info!(mode = ?timeline.mode, "Timeline toggled");
    Ok(Json(timeline))
}

/// Move the cursor. Enters replay.
pub async fn scrub(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScrubRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let time = req
        .time
        .resolve()
        .ok_or_else(|| ObserverError::InvalidRequest("time out of range".to_owned()))?;
    Ok(Json(state.engine.scrub(time).await?))
}

/// Step the cursor back. Enters replay. An empty body uses the default step.
pub async fn rewind(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RewindRequest>>,
) -> Result<impl IntoResponse, ObserverError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let step = match req.step_ms {
        Some(ms) => Some(TimeDelta::try_milliseconds(ms).ok_or_else(|| {
            ObserverError::InvalidRequest("step_ms out of range".to_owned())
        })?),
        None => None,
    };
    Ok(Json(state.engine.rewind(step).await?))
}

/// Return to live.
pub async fn resume_live(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.resume_live().await?))
}

// ---------------------------------------------------------------------------
// Metrics and observation
// ---------------------------------------------------------------------------

/// Set stability; resonance is recomputed.
pub async fn set_stability(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StabilityRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.engine.set_stability(req.stability).await?))
}

/// Observe a particle's quantum state. Repeat observations return the
/// first outcome.
pub async fn collapse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<CollapseRequest>>,
) -> Result<impl IntoResponse, ObserverError> {
    let id: HyperBitId = id
        .parse()
        .map_err(|e| ObserverError::InvalidRequest(format!("invalid particle id: {e}")))?;
    let bias = body
        .and_then(|Json(r)| r.bias)
        .unwrap_or(DEFAULT_BIAS);
    Ok(Json(state.engine.collapse(id, bias).await?))
}
