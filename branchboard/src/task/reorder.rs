//! ReorderTask command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::store::OrderSnapshot;
use crate::types::{PartitionKey, Status, Task, TaskId, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Move a task before another inside one partition.
///
/// The whole partition is renumbered 0..n-1 and sent in a single
/// `reorder_tasks` call, so repeating a reorder is harmless.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReorderTask {
    pub moved: TaskId,
    /// Task to insert before. The moved task goes to the end when this is
    /// absent or not in the partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<TaskId>,
    pub status: Status,
    pub version: VersionKey,
}

operation!(ReorderTask, verb = "reorder", noun = "task");

impl ReorderTask {
    pub fn new(moved: impl Into<TaskId>, status: Status, version: impl Into<VersionKey>) -> Self {
        Self {
            moved: moved.into(),
            before: None,
            status,
            version: version.into(),
        }
    }

    pub fn with_before(mut self, before: impl Into<TaskId>) -> Self {
        self.before = Some(before.into());
        self
    }

    fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.status, self.version.clone())
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for ReorderTask {
    /// The partition in its new order
    type Output = Vec<Task>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Vec<Task>> {
        let op = self.op_string();
        let partition = self.partition();
        traced(self.span(), async {
            if self.before.as_ref() == Some(&self.moved) {
                tracing::debug!(id = %self.moved, "dropped onto itself");
                return Ok(members(ctx, &partition));
            }

            optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    ctx.write_tasks(|store| -> Result<(OrderSnapshot, Vec<TaskId>)> {
                        let order =
                            store.plan_reorder(&self.moved, self.before.as_ref(), &partition)?;
                        let snapshot = store.apply_order(&order);
                        Ok((snapshot, order))
                    })
                },
                move |order| async move { ctx.gateway().reorder_tasks(&order).await },
                |ctx, snapshot| {
                    let skipped = ctx.write_tasks(|store| store.restore_order(&snapshot));
                    if skipped > 0 {
                        tracing::warn!(skipped, "newer local changes kept during rollback");
                    }
                },
            )
            .await?;

            tracing::info!(id = %self.moved, partition = %partition, "reordered partition");
            Ok(members(ctx, &partition))
        })
        .await
    }
}

fn members(ctx: &BoardContext, partition: &PartitionKey) -> Vec<Task> {
    ctx.read_tasks(|store| store.partition(partition).into_iter().cloned().collect())
}
