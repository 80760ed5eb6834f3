//! Error types for nQuester.

use thiserror::Error;

/// Top-level error type for nQuester operations.
///
/// Gameplay modules keep their own narrow error enums and convert into this
/// type when a caller wants a single error surface.
#[derive(Debug, Error)]
pub enum NquesterError {
    /// Authored content (quest catalog, NPC roster) is invalid
    #[error("Content error: {0}")]
    Content(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Result type alias for nQuester operations.
pub type NquesterResult<T> = Result<T, NquesterError>;
