//! MoveTask command

use super::{ReorderTask, UpdateTask};
use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::types::{PartitionKey, Status, Task, TaskId, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Drop a task into a board cell, optionally before another task.
///
/// - Same partition, with a distinct target: reorder.
/// - Same partition, no target or onto itself: nothing happens.
/// - Other partition: the task moves to the end of the new partition, then
///   is reordered before the target when the target lives there.
///
/// A target task that no longer exists makes the whole drop stale.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveTask {
    pub id: TaskId,
    pub status: Status,
    pub version: VersionKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<TaskId>,
}

operation!(MoveTask, verb = "move", noun = "task");

impl MoveTask {
    pub fn new(id: impl Into<TaskId>, status: Status, version: impl Into<VersionKey>) -> Self {
        Self {
            id: id.into(),
            status,
            version: version.into(),
            before: None,
        }
    }

    pub fn with_before(mut self, before: impl Into<TaskId>) -> Self {
        self.before = Some(before.into());
        self
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for MoveTask {
    /// The moved task, or `None` when the drop changed nothing
    type Output = Option<Task>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Option<Task>> {
        traced(self.span(), async {
            let task = ctx
                .task(&self.id)
                .ok_or_else(|| BoardError::stale("task", &self.id))?;
            // Drop targets are checked at drop time; the lane may be gone
            if ctx.read_versions(|registry| registry.resolve(&self.version).is_none()) {
                return Err(BoardError::stale("version", &self.version));
            }
            if let Some(before) = &self.before {
                if ctx.task(before).is_none() {
                    return Err(BoardError::stale("task", before));
                }
            }

            let target = PartitionKey::new(self.status, self.version.clone());

            if task.in_partition(&target) {
                return match &self.before {
                    Some(before) if before != &self.id => {
                        ReorderTask::new(self.id.clone(), self.status, self.version.clone())
                            .with_before(before.clone())
                            .execute(ctx)
                            .await?;
                        Ok(ctx.task(&self.id))
                    }
                    _ => {
                        tracing::debug!(id = %self.id, "dropped back in place");
                        Ok(None)
                    }
                };
            }

            UpdateTask::new(self.id.clone())
                .with_status(self.status)
                .with_version(self.version.clone())
                .execute(ctx)
                .await?;

            let before_in_target = self.before.as_ref().filter(|before| {
                ctx.read_tasks(|store| store.get(before).is_some_and(|t| t.in_partition(&target)))
            });
            if let Some(before) = before_in_target {
                ReorderTask::new(self.id.clone(), self.status, self.version.clone())
                    .with_before(before.clone())
                    .execute(ctx)
                    .await?;
            }

            Ok(ctx.task(&self.id))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use crate::task::{AddTask, RemoveTask};
    use crate::version::DeleteVersion;
    use std::sync::Arc;

    struct Board {
        gateway: Arc<MemoryGateway>,
        ctx: BoardContext,
        /// (todo, v1) = [a, b]
        a: TaskId,
        b: TaskId,
        /// (done, v1) = [x, y]
        x: TaskId,
        y: TaskId,
    }

    async fn setup() -> Board {
        let gateway = Arc::new(MemoryGateway::new());
        let ctx = BoardContext::from_shared(gateway.clone());
        let mut ids = Vec::new();
        for (title, status) in [
            ("A", Status::Todo),
            ("B", Status::Todo),
            ("X", Status::Done),
            ("Y", Status::Done),
        ] {
            let task = AddTask::quick(title, status, "v1").execute(&ctx).await.unwrap();
            ids.push(task.id);
        }
        gateway.clear_calls();
        Board {
            gateway,
            ctx,
            a: ids[0].clone(),
            b: ids[1].clone(),
            x: ids[2].clone(),
            y: ids[3].clone(),
        }
    }

    fn partition(ctx: &BoardContext, status: Status) -> Vec<TaskId> {
        ctx.read_tasks(|s| s.partition_ids(&PartitionKey::new(status, "v1")))
    }

    #[tokio::test]
    async fn test_same_partition_with_target_reorders() {
        let board = setup().await;
        MoveTask::new(board.b.clone(), Status::Todo, "v1")
            .with_before(board.a.clone())
            .execute(&board.ctx)
            .await
            .unwrap();

        assert_eq!(partition(&board.ctx, Status::Todo), vec![board.b, board.a]);
        assert_eq!(board.gateway.calls(), vec![GatewayOp::ReorderTasks]);
    }

    #[tokio::test]
    async fn test_same_partition_without_target_is_noop() {
        let board = setup().await;

        let none = MoveTask::new(board.a.clone(), Status::Todo, "v1")
            .execute(&board.ctx)
            .await
            .unwrap();
        let onto_self = MoveTask::new(board.a.clone(), Status::Todo, "v1")
            .with_before(board.a.clone())
            .execute(&board.ctx)
            .await
            .unwrap();

        assert!(none.is_none());
        assert!(onto_self.is_none());
        assert!(board.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cross_partition_append() {
        let board = setup().await;
        let moved = MoveTask::new(board.a.clone(), Status::Done, "v1")
            .execute(&board.ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(moved.status, Status::Done);
        assert_eq!(
            partition(&board.ctx, Status::Done),
            vec![board.x, board.y, board.a]
        );
        assert_eq!(board.gateway.calls(), vec![GatewayOp::UpdateTask]);
    }

    #[tokio::test]
    async fn test_cross_partition_before_target() {
        let board = setup().await;
        MoveTask::new(board.a.clone(), Status::Done, "v1")
            .with_before(board.y.clone())
            .execute(&board.ctx)
            .await
            .unwrap();

        assert_eq!(
            partition(&board.ctx, Status::Done),
            vec![board.x.clone(), board.a.clone(), board.y.clone()]
        );
        assert_eq!(partition(&board.ctx, Status::Todo), vec![board.b]);
        assert_eq!(
            board.gateway.calls(),
            vec![GatewayOp::UpdateTask, GatewayOp::ReorderTasks]
        );
    }

    #[tokio::test]
    async fn test_round_trip_keeps_counts() {
        let board = setup().await;
        MoveTask::new(board.a.clone(), Status::Done, "v2")
            .execute(&board.ctx)
            .await
            .unwrap();
        MoveTask::new(board.a.clone(), Status::Todo, "v1")
            .execute(&board.ctx)
            .await
            .unwrap();

        assert_eq!(partition(&board.ctx, Status::Todo), vec![board.b, board.a]);
        assert_eq!(partition(&board.ctx, Status::Done).len(), 2);
    }

    #[tokio::test]
    async fn test_drop_on_deleted_lane_is_stale() {
        let board = setup().await;
        DeleteVersion::to_backlog("v2").execute(&board.ctx).await.unwrap();
        board.gateway.clear_calls();

        let result = MoveTask::new(board.a.clone(), Status::Todo, "v2")
            .execute(&board.ctx)
            .await;

        assert!(result.unwrap_err().is_stale());
        assert!(board.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drop_before_deleted_task_is_stale() {
        let board = setup().await;
        RemoveTask::new(board.b.clone())
            .execute(&board.ctx)
            .await
            .unwrap();
        board.gateway.clear_calls();

        let same = MoveTask::new(board.a.clone(), Status::Todo, "v1")
            .with_before(board.b.clone())
            .execute(&board.ctx)
            .await;
        assert!(same.unwrap_err().is_stale());

        let across = MoveTask::new(board.x.clone(), Status::Todo, "v1")
            .with_before(board.b.clone())
            .execute(&board.ctx)
            .await;
        assert!(across.unwrap_err().is_stale());

        assert!(board.gateway.calls().is_empty());
        assert_eq!(board.ctx.task(&board.a).unwrap().sort_order, Some(0));
        assert_eq!(board.ctx.task(&board.x).unwrap().status, Status::Done);
    }

    #[tokio::test]
    async fn test_missing_task_is_stale() {
        let board = setup().await;
        let result = MoveTask::new("gone", Status::Todo, "v1").execute(&board.ctx).await;
        assert!(result.unwrap_err().is_stale());
    }
}
