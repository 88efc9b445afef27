//! UpdateTask command

use super::{validate_title, validate_version};
use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::store::TaskSnapshot;
use crate::types::{Priority, Status, Task, TaskId, TaskPatch, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Update a task's fields.
///
/// Moving the task to another (status, version) partition lands it at the
/// end of the new partition. Position within a partition is only changed by
/// [`ReorderTask`](super::ReorderTask).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateTask {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

operation!(UpdateTask, verb = "update", noun = "task");

impl UpdateTask {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            status: None,
            version: None,
            priority: None,
        }
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
        self.version = Some(version.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Validate the fields and build the patch
    fn to_patch(&self, ctx: &BoardContext) -> Result<TaskPatch> {
        let mut patch = TaskPatch::new();
        if let Some(title) = &self.title {
            patch.title = Some(validate_title(title)?);
        }
        if let Some(version) = &self.version {
            validate_version(ctx, version)?;
            patch.version_id = Some(version.clone());
        }
        patch.description = self.description.clone();
        patch.status = self.status;
        patch.priority = self.priority;
        Ok(patch)
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for UpdateTask {
    type Output = Task;

    async fn execute(&self, ctx: &BoardContext) -> Result<Task> {
        let op = self.op_string();
        traced(self.span(), async {
            let patch = self.to_patch(ctx)?;
            if patch.is_empty() {
                tracing::debug!(id = %self.id, "empty patch, nothing to send");
                return ctx
                    .task(&self.id)
                    .ok_or_else(|| BoardError::stale("task", &self.id));
            }

            let applied = optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    ctx.write_tasks(|store| -> Result<(TaskSnapshot, TaskPatch)> {
                        let task = store
                            .get(&self.id)
                            .ok_or_else(|| BoardError::stale("task", &self.id))?;

                        let mut patch = patch;
                        if patch.moves_partition(task) {
                            patch.sort_order =
                                Some(store.next_sort_order(&patch.target_partition(task)));
                        }
                        let snapshot = store
                            .patch(&self.id, &patch)
                            .ok_or_else(|| BoardError::stale("task", &self.id))?;
                        Ok((snapshot, patch))
                    })
                },
                move |patch| async move { ctx.gateway().update_task(&self.id, &patch).await },
                |ctx, snapshot| {
                    if !ctx.write_tasks(|store| store.restore(snapshot)) {
                        tracing::warn!(id = %self.id, "newer local change kept during rollback");
                    }
                },
            )
            .await?;

            let echo = applied.value;
            let revision = applied.snapshot.revision;
            if !ctx.write_tasks(|store| store.merge_echo(echo, revision)) {
                tracing::debug!(id = %self.id, "echo skipped, record changed locally");
            }

            let task = ctx
                .task(&self.id)
                .ok_or_else(|| BoardError::stale("task", &self.id))?;
            tracing::info!(id = %task.id, partition = %task.partition(), "updated task");
            Ok(task)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use crate::task::AddTask;
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryGateway>, BoardContext, Task) {
        let gateway = Arc::new(MemoryGateway::new());
        let ctx = BoardContext::from_shared(gateway.clone());
        let task = AddTask::quick("Original", Status::Todo, "v1")
            .with_description("Some words")
            .execute(&ctx)
            .await
            .unwrap();
        (gateway, ctx, task)
    }

    #[tokio::test]
    async fn test_update_fields() {
        let (gateway, ctx, task) = setup().await;

        let updated = UpdateTask::new(task.id.clone())
            .with_title("Renamed")
            .with_priority(Priority::High)
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.description, "Some words");
        assert_eq!(updated.sort_order, Some(0));
        assert_eq!(gateway.stored_task(&task.id).unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_partition_change_lands_at_tail() {
        let (_gateway, ctx, task) = setup().await;
        AddTask::quick("Already done", Status::Done, "v1")
            .execute(&ctx)
            .await
            .unwrap();

        let moved = UpdateTask::new(task.id.clone())
            .with_status(Status::Done)
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(moved.status, Status::Done);
        assert_eq!(moved.sort_order, Some(1));
    }

    #[tokio::test]
    async fn test_updates_never_tie_sort_orders() {
        let (_gateway, ctx, first) = setup().await;
        let second = AddTask::quick("Second", Status::Todo, "v1")
            .execute(&ctx)
            .await
            .unwrap();
        let elsewhere = AddTask::quick("Elsewhere", Status::Done, "v1")
            .execute(&ctx)
            .await
            .unwrap();

        UpdateTask::new(second.id.clone())
            .with_title("Second, edited")
            .with_priority(Priority::High)
            .execute(&ctx)
            .await
            .unwrap();
        UpdateTask::new(elsewhere.id.clone())
            .with_status(Status::Todo)
            .execute(&ctx)
            .await
            .unwrap();
        UpdateTask::new(first.id.clone())
            .with_description("Edited too")
            .execute(&ctx)
            .await
            .unwrap();

        let orders: Vec<Option<i64>> = ctx
            .tasks()
            .into_iter()
            .filter(|t| t.status == Status::Todo)
            .map(|t| t.sort_order)
            .collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_sort_order_in_input_is_ignored() {
        let (gateway, ctx, first) = setup().await;
        let second = AddTask::quick("Second", Status::Todo, "v1")
            .execute(&ctx)
            .await
            .unwrap();
        gateway.clear_calls();

        let json = format!(r#"{{"id": "{}", "title": "Jump", "sort_order": 0}}"#, second.id);
        let update: UpdateTask = serde_json::from_str(&json).unwrap();
        let updated = update.execute(&ctx).await.unwrap();

        assert_eq!(updated.title, "Jump");
        assert_eq!(updated.sort_order, Some(1));
        assert_eq!(ctx.task(&first.id).unwrap().sort_order, Some(0));
        assert_eq!(gateway.calls(), vec![GatewayOp::UpdateTask]);
    }

    #[tokio::test]
    async fn test_empty_patch_makes_no_call() {
        let (gateway, ctx, task) = setup().await;
        gateway.clear_calls();

        let same = UpdateTask::new(task.id.clone()).execute(&ctx).await.unwrap();
        assert_eq!(same, task);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_restores_every_field() {
        let (gateway, ctx, task) = setup().await;
        gateway.fail(GatewayOp::UpdateTask);

        let result = UpdateTask::new(task.id.clone())
            .with_title("Changed")
            .with_description("Other words")
            .with_status(Status::InProgress)
            .with_version("v2")
            .with_priority(Priority::Medium)
            .execute(&ctx)
            .await;

        assert!(matches!(result, Err(BoardError::RemoteRejection { .. })));
        assert_eq!(ctx.task(&task.id).unwrap(), task);
    }

    #[tokio::test]
    async fn test_validation() {
        let (gateway, ctx, task) = setup().await;
        gateway.clear_calls();

        let blank = UpdateTask::new(task.id.clone()).with_title(" ").execute(&ctx).await;
        assert!(matches!(blank, Err(BoardError::Validation { .. })));

        let ghost = UpdateTask::new(task.id.clone())
            .with_version("ghost")
            .execute(&ctx)
            .await;
        assert!(matches!(ghost, Err(BoardError::Validation { .. })));

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_task_is_stale() {
        let (gateway, ctx, _task) = setup().await;
        gateway.clear_calls();

        let result = UpdateTask::new("missing").with_title("x").execute(&ctx).await;
        assert!(result.unwrap_err().is_stale());
        assert!(gateway.calls().is_empty());
    }
}
