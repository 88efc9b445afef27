//! ListTasks command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, Execute};
use crate::types::{Status, Task, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// List tasks, optionally narrowed to a status and/or a version.
///
/// Results are grouped by version then status, each partition in order.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ListTasks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionKey>,
}

operation!(ListTasks, verb = "list", noun = "tasks");

impl ListTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_version(mut self, version: impl Into<VersionKey>) -> Self {
        self.version = Some(version.into());
        self
    }

    fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.version.as_ref().is_none_or(|v| &task.version_id == v)
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for ListTasks {
    type Output = Vec<Task>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Vec<Task>> {
        Ok(ctx
            .tasks()
            .into_iter()
            .filter(|task| self.matches(task))
            .collect())
    }
}
