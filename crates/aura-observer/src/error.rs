//! Error types for the operator API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use aura_core::commands::CommandError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the operator API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The engine rejected or could not run a command.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The request body or path was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Command(CommandError::EmptyMessage | CommandError::EmptyPrompt)
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Command(CommandError::UnknownParticle { .. }) => StatusCode::NOT_FOUND,
            Self::Command(CommandError::EngineStopped) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use aura_types::HyperBitId;

    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (ObserverError::from(CommandError::EmptyMessage), 400),
            (ObserverError::InvalidRequest("x".to_owned()), 400),
            (
                ObserverError::from(CommandError::UnknownParticle {
                    id: HyperBitId::new(),
                }),
                404,
            ),
            (ObserverError::from(CommandError::EngineStopped), 503),
        ];
        for (err, code) in cases {
            assert_eq!(err.into_response().status().as_u16(), code);
        }
    }
}
