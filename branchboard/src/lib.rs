//! Task/version board engine with optimistic sync
//!
//! This crate maintains a two-dimensional classification of work items
//! (workflow status × release version), a manually orderable registry of
//! versions, and a drag-driven reordering protocol. Every mutation is applied
//! to the in-memory state first and then confirmed through a [`SyncGateway`];
//! a rejected call restores the pre-mutation snapshot.
//!
//! ## Overview
//!
//! - **Version Registry** - ordered versions plus the permanent `backlog` catch-all
//! - **Task Store** - tasks partitioned by (status, version), each partition ordered independently
//! - **Board Projection** - pure derivation of lanes and status buckets for display
//! - **Drag Controller** - a device-independent state machine that turns drops into moves
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use branchboard::{BoardContext, Execute, MemoryGateway, Status};
//! use branchboard::board::LoadBoard;
//! use branchboard::task::{AddTask, MoveTask};
//! use branchboard::version::CreateVersion;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = BoardContext::new(MemoryGateway::new());
//! LoadBoard::new().execute(&ctx).await?;
//!
//! let sprint = CreateVersion::new("Sprint 7").execute(&ctx).await?;
//! let task = AddTask::new("Fix typo")
//!     .with_status(Status::Todo)
//!     .with_version(sprint.key.clone())
//!     .execute(&ctx)
//!     .await?;
//!
//! MoveTask::new(task.id, Status::Done, sprint.key).execute(&ctx).await?;
//! # Ok(())
//! # }
//! ```

mod context;
pub mod defaults;
mod error;
pub mod notify;
mod operation;
mod optimistic;
pub mod projection;
pub mod registry;
pub mod store;
pub mod types;

// Command modules
pub mod board;
pub mod drag;
pub mod gateway;
pub mod task;
pub mod version;

pub use context::BoardContext;
pub use drag::{BoardSession, DragController, DragEvent, DragOutcome};
pub use error::{BoardError, Result};
pub use gateway::{FileGateway, GatewayError, GatewayOp, MemoryGateway, SyncGateway};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use operation::{Execute, Operation};
pub use projection::{project, BoardFilter, Lane, StatusBucket};
pub use registry::VersionRegistry;
pub use store::TaskStore;

// Re-export commonly used types
pub use types::{
    NewTask, NewVersion, Origin, PartitionKey, Priority, Status, Task, TaskId, TaskPatch, Version,
    VersionKey,
};

pub use async_trait::async_trait;
