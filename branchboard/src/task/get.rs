//! GetTask command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, Execute};
use crate::types::{Task, TaskId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Get a task by ID
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GetTask {
    pub id: TaskId,
}

operation!(GetTask, verb = "get", noun = "task");

impl GetTask {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for GetTask {
    type Output = Task;

    async fn execute(&self, ctx: &BoardContext) -> Result<Task> {
        ctx.task(&self.id)
            .ok_or_else(|| BoardError::stale("task", &self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::task::AddTask;

    #[tokio::test]
    async fn test_get_task() {
        let ctx = BoardContext::new(MemoryGateway::new());
        let added = AddTask::new("Find me").execute(&ctx).await.unwrap();

        let found = GetTask::new(added.id.clone()).execute(&ctx).await.unwrap();
        assert_eq!(found, added);

        let missing = GetTask::new("nope").execute(&ctx).await;
        assert!(missing.unwrap_err().is_stale());
    }
}
