//! Error types for the booksum CLI.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, provider construction, generation,
//! and the history store.

use thiserror::Error;

/// Unified error type for the booksum CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A provider could not be constructed or used at all
    /// (missing credential, unreachable runtime, unknown model).
    /// Surfaced before any chunking work begins.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A single generation call failed (remote error, decoding error,
    /// resource exhaustion).
    #[error("Generation failed: {0}")]
    Generation(String),

    /// History store errors
    #[error("History error: {0}")]
    History(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
