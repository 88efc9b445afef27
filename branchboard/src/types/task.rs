//! Task types: Task, Status, Priority, NewTask, TaskPatch

use super::ids::{TaskId, VersionKey};
use crate::error::BoardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort key for tasks that were never given a position. Sorts after every
/// assigned position.
pub const UNASSIGNED_SORT_ORDER: i64 = i64::MAX;

/// Workflow status of a task (the board's columns)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// All statuses in column order
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Human-readable column heading
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" | "in-progress" | "doing" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(BoardError::validation(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "0" => Ok(Self::Low),
            "medium" | "1" => Ok(Self::Medium),
            "high" | "2" => Ok(Self::High),
            other => Err(BoardError::validation(
                "priority",
                format!("unknown priority '{}'", other),
            )),
        }
    }
}

/// The (status, version) pair that identifies a partition: the unit within
/// which tasks are manually ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub status: Status,
    pub version: VersionKey,
}

impl PartitionKey {
    pub fn new(status: Status, version: impl Into<VersionKey>) -> Self {
        Self {
            status,
            version: version.into(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.status, self.version)
    }
}

/// A task/card on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub version_id: VersionKey,
    /// Position within the partition. `None` means never positioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    /// Local mutation counter, stamped by the task store. Never persisted.
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl Task {
    /// Create a new task in the given partition
    pub fn new(title: impl Into<String>, status: Status, version: impl Into<VersionKey>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: String::new(),
            status,
            version_id: version.into(),
            sort_order: None,
            priority: Priority::default(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the sort order
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// The partition this task belongs to
    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.status, self.version_id.clone())
    }

    /// Whether this task is a member of the given partition
    pub fn in_partition(&self, key: &PartitionKey) -> bool {
        self.status == key.status && self.version_id == key.version
    }

    /// Ordering key within a partition: sort_order with unassigned last,
    /// ties broken by id.
    pub fn sort_key(&self) -> (i64, &str) {
        (
            self.sort_order.unwrap_or(UNASSIGNED_SORT_ORDER),
            self.id.as_str(),
        )
    }

    /// Local mutation counter
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Fields for a task that does not exist yet. The gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub version_id: VersionKey,
    pub priority: Priority,
    pub sort_order: i64,
}

impl NewTask {
    /// Build the canonical record the gateway would return for these fields
    pub fn into_task(self, id: TaskId) -> Task {
        let now = Utc::now();
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            version_id: self.version_id,
            sort_order: Some(self.sort_order),
            priority: self.priority,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }
}

/// A partial update. Every `Some` field replaces the task's value; the patch
/// is applied to all fields or none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<VersionKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_version(mut self, version: impl Into<VersionKey>) -> Self {
        self.version_id = Some(version.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.version_id.is_none()
            && self.sort_order.is_none()
            && self.priority.is_none()
    }

    /// The partition the task would land in after this patch
    pub fn target_partition(&self, task: &Task) -> PartitionKey {
        PartitionKey::new(
            self.status.unwrap_or(task.status),
            self.version_id
                .clone()
                .unwrap_or_else(|| task.version_id.clone()),
        )
    }

    /// Whether applying this patch moves the task to another partition
    pub fn moves_partition(&self, task: &Task) -> bool {
        !task.in_partition(&self.target_partition(task))
    }

    /// Apply every field of the patch to the task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(version) = &self.version_id {
            task.version_id = version.clone();
        }
        if let Some(sort_order) = self.sort_order {
            task.sort_order = Some(sort_order);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("todo".parse::<Status>().unwrap(), Status::Todo);
        assert_eq!("In-Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Done);
        assert!("blocked".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_priority_accepts_legacy_integers() {
        assert_eq!("2".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
    }

    #[test]
    fn test_task_defaults_from_sparse_record() {
        let task: Task = serde_json::from_str(r#"{"id": "t1", "title": "Sparse"}"#).unwrap();
        assert_eq!(task.status, Status::Todo);
        assert!(task.version_id.is_backlog());
        assert_eq!(task.sort_order, None);
        assert_eq!(task.sort_key().0, UNASSIGNED_SORT_ORDER);
    }

    #[test]
    fn test_revision_not_serialized() {
        let mut task = Task::new("T", Status::Todo, "v1");
        task.revision = 7;
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("revision").is_none());
    }

    #[test]
    fn test_patch_moves_partition() {
        let task = Task::new("T", Status::Todo, "v1");
        assert!(!TaskPatch::new().with_title("x").moves_partition(&task));
        assert!(TaskPatch::new()
            .with_status(Status::Done)
            .moves_partition(&task));
        assert!(TaskPatch::new().with_version("v2").moves_partition(&task));
        assert!(!TaskPatch::new()
            .with_status(Status::Todo)
            .with_version("v1")
            .moves_partition(&task));
    }

    #[test]
    fn test_patch_apply_to() {
        let mut task = Task::new("Old", Status::Todo, "v1").with_sort_order(3);
        TaskPatch::new()
            .with_title("New")
            .with_status(Status::Done)
            .with_priority(Priority::High)
            .apply_to(&mut task);

        assert_eq!(task.title, "New");
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.sort_order, Some(3));
        assert_eq!(task.version_id.as_str(), "v1");
    }

    #[test]
    fn test_empty_patch() {
        assert!(TaskPatch::new().is_empty());
        assert!(!TaskPatch::new().with_sort_order(0).is_empty());
    }
}
