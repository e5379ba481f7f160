//! Error types for playlist management
//!
//! Structural requests (insert, remove, move) never fail; they clamp. Errors
//! only come out of collaborator seams and single-row requests that have
//! nothing sensible to clamp to.

use thiserror::Error;

/// Playlist errors
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// Row does not exist
    #[error("Row out of range: {0}")]
    RowOutOfRange(usize),

    /// Entry at row has nowhere to persist a rating
    #[error("Row {0} cannot be rated")]
    NotRateable(usize),

    /// Dynamic generator failed
    #[error("Generator error: {0}")]
    Generator(String),

    /// Persistence backend failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Snapshot (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaylistError {
    /// Create a generator error
    pub fn generator(msg: impl Into<String>) -> Self {
        Self::Generator(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

impl From<config::ConfigError> for PlaylistError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playlist operations
pub type Result<T> = std::result::Result<T, PlaylistError>;
