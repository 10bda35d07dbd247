//! Error types for the JamHub membership core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire JamHub workspace.
///
/// Every failure of a membership operation is surfaced through one of these
/// variants. Nothing in the core logs an error and carries on.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JamError {
    /// The supplied join code does not match the session's code
    #[error("Invalid join code for session '{session_id}'")]
    InvalidCode { session_id: String },

    /// An identifier that cannot address a record (empty or containing `/`)
    #[error("Invalid {entity_type} id '{id}'")]
    InvalidId {
        entity_type: &'static str,
        id: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A transaction did not complete within the configured timeout
    #[error("Operation '{operation}' timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    /// A record pinned by a transaction changed before it committed
    #[error("Transaction conflict on '{path}'")]
    TransactionConflict { path: String },

    /// The caller must be the session host for this operation
    #[error("User '{user_id}' is not the host of session '{session_id}'")]
    NotHost { user_id: String, session_id: String },

    /// A host cannot leave their own session; they end it instead
    #[error("Host '{user_id}' cannot leave session '{session_id}'")]
    HostCannotLeave { user_id: String, session_id: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (store layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JamError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an InvalidId error
    pub fn invalid_id(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::InvalidId {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an InvalidCode error
    pub fn invalid_code(session_id: impl Into<String>) -> Self {
        Self::InvalidCode {
            session_id: session_id.into(),
        }
    }

    /// Creates a TransactionConflict error
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::TransactionConflict { path: path.into() }
    }

    /// Creates a Timeout error
    pub fn timeout(operation: impl Into<String>, after_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_ms,
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an InvalidId error
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }

    /// Check if this is an InvalidCode error
    pub fn is_invalid_code(&self) -> bool {
        matches!(self, Self::InvalidCode { .. })
    }

    /// Check if this is a TransactionConflict error.
    ///
    /// Conflicts signal contention rather than a logical error, so they are
    /// the only failures the application layer retries.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::TransactionConflict { .. })
    }

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for JamError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for JamError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for JamError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for JamError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, JamError>`.
pub type Result<T> = std::result::Result<T, JamError>;
