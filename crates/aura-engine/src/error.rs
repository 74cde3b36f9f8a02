//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can abort startup, so `main`
//! can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: aura_core::config::ConfigError,
    },

    /// The record store could not be reached or read.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: aura_db::DbError,
    },

    /// The completion service client could not be built.
    #[error("oracle error: {source}")]
    Oracle {
        /// The underlying oracle error.
        #[from]
        source: aura_oracle::OracleError,
    },

    /// Operator server failed to start.
    #[error("observer error: {message}")]
    Observer {
        /// Description of the observer failure.
        message: String,
    },
}
