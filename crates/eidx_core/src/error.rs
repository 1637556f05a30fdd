//! Error types for the EID index and registry.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in registry operations.
///
/// Lookups and searches never fail: a missing key is an empty result.
/// Errors are reserved for rejected input and failed snapshot imports.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A metadata record failed validation.
    #[error("invalid record {eid:?}: {message}")]
    InvalidRecord {
        /// The offending EID (may be empty).
        eid: String,
        /// Description of the problem.
        message: String,
    },

    /// A snapshot could not be imported. The registry was left unchanged.
    #[error("state import failed: {message}")]
    StateImport {
        /// Description of why the snapshot was rejected.
        message: String,
    },

    /// JSON encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates an invalid record error.
    pub fn invalid_record(eid: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            eid: eid.into(),
            message: message.into(),
        }
    }

    /// Creates a state import error.
    pub fn state_import(message: impl Into<String>) -> Self {
        Self::StateImport {
            message: message.into(),
        }
    }

    /// Returns true if this error came from a rejected snapshot import.
    #[must_use]
    pub fn is_state_import(&self) -> bool {
        matches!(self, Self::StateImport { .. })
    }
}
