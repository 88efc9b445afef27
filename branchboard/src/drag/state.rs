//! Drag states and the pure transition function

use crate::types::{PartitionKey, Status, TaskId, VersionKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One board cell: a status column inside a version lane
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub status: Status,
    pub version: VersionKey,
}

impl Cell {
    pub fn new(status: Status, version: impl Into<VersionKey>) -> Self {
        Self {
            status,
            version: version.into(),
        }
    }

    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.status, self.version.clone())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.version, self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    /// Carrying a task outside any drop zone
    Dragging { task: TaskId },
    /// Over a cell, but not over a specific task
    HoveringEmptyCell { task: TaskId, cell: Cell },
    /// Over `target`, which sits in `cell`
    HoveringTask {
        task: TaskId,
        target: TaskId,
        cell: Cell,
    },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The task being carried, if any
    pub fn task(&self) -> Option<&TaskId> {
        match self {
            Self::Idle => None,
            Self::Dragging { task }
            | Self::HoveringEmptyCell { task, .. }
            | Self::HoveringTask { task, .. } => Some(task),
        }
    }

    /// Apply one event.
    ///
    /// Returns the next state and, for a drop over a zone, what to do with
    /// the carried task. Events that make no sense in the current state leave
    /// it unchanged.
    pub fn on(self, event: &DragEvent) -> (DragState, Option<DropIntent>) {
        let Some(task) = self.task().cloned() else {
            return match event {
                DragEvent::Start { task } => (Self::Dragging { task: task.clone() }, None),
                _ => (Self::Idle, None),
            };
        };

        match (self, event) {
            // Only one drag at a time
            (state, DragEvent::Start { .. }) => (state, None),
            (_, DragEvent::Cancel) => (Self::Idle, None),
            (_, DragEvent::HoverCell { cell }) => (
                Self::HoveringEmptyCell {
                    task,
                    cell: cell.clone(),
                },
                None,
            ),
            (_, DragEvent::HoverTask { target, cell }) => (
                Self::HoveringTask {
                    task,
                    target: target.clone(),
                    cell: cell.clone(),
                },
                None,
            ),
            (_, DragEvent::Leave) => (Self::Dragging { task }, None),
            (Self::HoveringEmptyCell { cell, .. }, DragEvent::Drop) => (
                Self::Idle,
                Some(DropIntent {
                    task,
                    cell,
                    action: DropAction::Append,
                }),
            ),
            (Self::HoveringTask { target, cell, .. }, DragEvent::Drop) => (
                Self::Idle,
                Some(DropIntent {
                    task,
                    cell,
                    action: DropAction::InsertBefore(target),
                }),
            ),
            // Dropped outside every zone
            (_, DragEvent::Drop) => (Self::Idle, None),
        }
    }
}

/// Input from a pointer or keyboard driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    Start { task: TaskId },
    HoverCell { cell: Cell },
    HoverTask { target: TaskId, cell: Cell },
    /// Left every drop zone
    Leave,
    Drop,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Land at the end of the cell
    Append,
    /// Land immediately before this task
    InsertBefore(TaskId),
}

/// A completed drop, ready to become a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIntent {
    pub task: TaskId,
    pub cell: Cell,
    pub action: DropAction,
}

impl DropIntent {
    pub fn before(&self) -> Option<&TaskId> {
        match &self.action {
            DropAction::Append => None,
            DropAction::InsertBefore(target) => Some(target),
        }
    }
}
