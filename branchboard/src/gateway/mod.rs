//! Sync Gateway: the durable side of every mutation.
//!
//! The engine mutates its in-memory state first and then confirms through a
//! [`SyncGateway`]. Two adapters ship with the crate:
//!
//! - [`MemoryGateway`] keeps canonical records in process, records every call
//!   and can be told to reject specific operations.
//! - [`FileGateway`] stores one YAML file per task and per version under a
//!   data directory.

mod file;
mod memory;
mod records;

pub use file::FileGateway;
pub use memory::MemoryGateway;

use crate::types::{NewTask, NewVersion, Task, TaskId, TaskPatch, Version, VersionKey};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Gateway operations, used for call recording and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GatewayOp {
    ListTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ReorderTasks,
    ListVersions,
    CreateVersion,
    UpdateVersion,
    DeleteVersion,
    ReorderVersions,
}

impl GatewayOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListTasks => "list tasks",
            Self::CreateTask => "create task",
            Self::UpdateTask => "update task",
            Self::DeleteTask => "delete task",
            Self::ReorderTasks => "reorder tasks",
            Self::ListVersions => "list versions",
            Self::CreateVersion => "create version",
            Self::UpdateVersion => "update version",
            Self::DeleteVersion => "delete version",
            Self::ReorderVersions => "reorder versions",
        }
    }

    /// Whether the operation writes
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::ListTasks | Self::ListVersions)
    }
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by gateway adapters
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{op} rejected: {message}")]
    Rejected { op: String, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("could not lock data directory: {message}")]
    Lock { message: String },
}

impl GatewayError {
    pub fn rejected(op: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Rejected {
            op: op.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }
}

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Durable CRUD and reorder calls. Returned records are canonical.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    async fn list_tasks(&self) -> GatewayResult<Vec<Task>>;

    /// Create a task; the gateway assigns the id
    async fn create_task(&self, task: &NewTask) -> GatewayResult<Task>;

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task>;

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()>;

    /// Persist the full order of one partition
    async fn reorder_tasks(&self, ids: &[TaskId]) -> GatewayResult<()>;

    /// Stored version records, hidden tombstones included
    async fn list_versions(&self) -> GatewayResult<Vec<Version>>;

    async fn create_version(&self, version: &NewVersion) -> GatewayResult<Version>;

    async fn update_version(&self, key: &VersionKey, label: &str) -> GatewayResult<Version>;

    /// Delete a version and re-point its tasks to `reassign_to`
    async fn delete_version(&self, key: &VersionKey, reassign_to: &VersionKey)
        -> GatewayResult<()>;

    /// Persist the full order of the non-backlog versions
    async fn reorder_versions(&self, keys: &[VersionKey]) -> GatewayResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_strings() {
        assert_eq!(GatewayOp::ReorderTasks.to_string(), "reorder tasks");
        assert!(GatewayOp::DeleteVersion.is_mutation());
        assert!(!GatewayOp::ListVersions.is_mutation());
    }

    #[test]
    fn test_rejected_display() {
        let err = GatewayError::rejected(GatewayOp::UpdateTask, "conflict");
        assert_eq!(err.to_string(), "update task rejected: conflict");
    }
}
