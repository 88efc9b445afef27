//! Error types for the board engine

use crate::gateway::GatewayError;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// Input rejected before any local mutation or remote call
    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    /// Operation violates a structural rule of the board (e.g. touching backlog)
    #[error("constraint violation: {message}")]
    Constraint { message: String },

    /// The sync gateway rejected a call after the local state was already
    /// mutated. The local state has been rolled back by the time this is seen.
    #[error("{op} rejected by remote: {source}")]
    RemoteRejection {
        op: String,
        #[source]
        source: GatewayError,
    },

    /// The operation targets an entity that no longer exists locally
    #[error("stale reference to {kind}: {id}")]
    StaleReference { kind: String, id: String },
}

impl BoardError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a constraint violation
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    /// Create a remote rejection for the given op string
    pub fn remote(op: impl Into<String>, source: GatewayError) -> Self {
        Self::RemoteRejection {
            op: op.into(),
            source,
        }
    }

    /// Create a stale reference error
    pub fn stale(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::StaleReference {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Check if this is a stale reference (a silent no-op for interactive callers)
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }

    /// Check if this is a remote rejection
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteRejection { .. })
    }

    /// Errors that interactive callers absorb: a remote rejection has already
    /// been rolled back and surfaced through the notifier, and a stale
    /// reference is a no-op.
    pub fn is_absorbed(&self) -> bool {
        self.is_stale() || self.is_remote()
    }
}
