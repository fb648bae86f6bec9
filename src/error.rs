//! Error types for Cryptomoon
//!
//! This module defines the error taxonomy used throughout the client,
//! using `thiserror` for ergonomic error handling. Backend, storage and
//! configuration calls all surface failures through these variants.

use thiserror::Error;

/// Main error type for Cryptomoon operations
///
/// Backend clients report transport and decoding problems, the cache store
/// reports local-storage problems, and the configuration layer reports
/// invalid settings. None of these are fatal at component boundaries;
/// callers turn them into inline chat messages.
#[derive(Error, Debug)]
pub enum CryptomoonError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure or non-success HTTP status from a backend
    #[error("Network error: {0}")]
    Network(String),

    /// A backend answered with a body that could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Local cache read/write failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// No data is available (for example, an empty cache)
    #[error("No data available: {0}")]
    NoData(String),

    /// A background task ended abnormally
    #[error("Task failed: {0}")]
    Task(String),
}

/// Result type alias for Cryptomoon operations
///
/// Uses `anyhow::Error` so callers can attach context while the typed
/// [`CryptomoonError`] stays available through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
