//! Core types for the board engine

mod ids;
mod task;
mod version;

// Re-export all types
pub use ids::{TaskId, VersionKey};
pub use task::{NewTask, PartitionKey, Priority, Status, Task, TaskPatch, UNASSIGNED_SORT_ORDER};
pub use version::{NewVersion, Origin, Version, BACKLOG_ORDER_INDEX};
