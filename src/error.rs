//! Error types for the tour engine.
//!
//! None of these ever escape a tour operation. They travel between the
//! manager and its injected services (speech backend, settings store) and
//! are logged at that boundary.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Narration error: {0}")]
    Narration(#[from] NarrationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Settings store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Speech playback errors.
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("Speech backend {backend} is unavailable")]
    Unavailable { backend: String },

    #[error("Speech backend {backend} failed to start: {reason}")]
    SpawnFailed { backend: String, reason: String },

    #[error("Speech backend {backend} exited with {reason}")]
    PlaybackFailed { backend: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
