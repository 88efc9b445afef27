//! RemoveTask command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::types::{Task, TaskId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Delete a task. A rejected delete puts it back at its original position.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoveTask {
    pub id: TaskId,
}

operation!(RemoveTask, verb = "remove", noun = "task");

impl RemoveTask {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for RemoveTask {
    type Output = Task;

    async fn execute(&self, ctx: &BoardContext) -> Result<Task> {
        let op = self.op_string();
        traced(self.span(), async {
            let applied = optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    let removed = ctx
                        .write_tasks(|store| store.remove(&self.id))
                        .ok_or_else(|| BoardError::stale("task", &self.id))?;
                    Ok((removed, ()))
                },
                move |()| async move { ctx.gateway().delete_task(&self.id).await },
                |ctx, removed| {
                    if !ctx.write_tasks(|store| store.reinstate(removed)) {
                        tracing::warn!(id = %self.id, "id reused locally, removal rollback skipped");
                    }
                },
            )
            .await?;

            tracing::info!(id = %self.id, "removed task");
            Ok(applied.snapshot)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use crate::task::AddTask;
    use crate::types::{PartitionKey, Status};
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryGateway>, BoardContext, Vec<TaskId>) {
        let gateway = Arc::new(MemoryGateway::new());
        let ctx = BoardContext::from_shared(gateway.clone());
        let mut ids = Vec::new();
        for title in ["A", "B", "C"] {
            ids.push(AddTask::new(title).execute(&ctx).await.unwrap().id);
        }
        (gateway, ctx, ids)
    }

    fn backlog_todo(ctx: &BoardContext) -> Vec<TaskId> {
        ctx.read_tasks(|s| s.partition_ids(&PartitionKey::new(Status::Todo, "backlog")))
    }

    #[tokio::test]
    async fn test_remove_task() {
        let (gateway, ctx, ids) = setup().await;

        let removed = RemoveTask::new(ids[1].clone()).execute(&ctx).await.unwrap();

        assert_eq!(removed.title, "B");
        assert_eq!(backlog_todo(&ctx), vec![ids[0].clone(), ids[2].clone()]);
        assert!(gateway.stored_task(&ids[1]).is_none());
    }

    #[tokio::test]
    async fn test_rejection_restores_at_original_position() {
        let (gateway, ctx, ids) = setup().await;
        gateway.fail(GatewayOp::DeleteTask);

        let result = RemoveTask::new(ids[1].clone()).execute(&ctx).await;

        assert!(matches!(result, Err(BoardError::RemoteRejection { .. })));
        assert_eq!(backlog_todo(&ctx), ids);
        assert_eq!(ctx.task(&ids[1]).unwrap().sort_order, Some(1));
    }

    #[tokio::test]
    async fn test_missing_task_is_stale() {
        let (gateway, ctx, _ids) = setup().await;
        gateway.clear_calls();

        let result = RemoveTask::new("missing").execute(&ctx).await;
        assert!(result.unwrap_err().is_stale());
        assert!(gateway.calls().is_empty());
    }
}
