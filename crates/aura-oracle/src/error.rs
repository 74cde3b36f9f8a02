//! Error types for the completion collaborator.
//!
//! These never reach the operator: [`Oracle`](crate::Oracle) maps every
//! failure to a fixed fallback reply. They exist so the failure is logged
//! with its cause.

/// Errors that can occur while talking to the generative API.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Failed to load or render the system prompt template.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },

    /// The response had no usable content.
    #[error("response missing {0}")]
    MissingContent(&'static str),
}
