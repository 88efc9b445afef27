//! AddTask command

use super::{validate_title, validate_version};
use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::types::{NewTask, PartitionKey, Priority, Status, Task, TaskId, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Add a task at the end of its partition.
///
/// The task shows up immediately under a provisional id; the gateway's id
/// replaces it once the create call answers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddTask {
    /// The task title (required)
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to todo
    #[serde(default)]
    pub status: Status,
    /// Defaults to the backlog
    #[serde(default)]
    pub version: VersionKey,
    #[serde(default)]
    pub priority: Priority,
}

operation!(AddTask, verb = "add", noun = "task");

impl AddTask {
    /// Create a new AddTask command with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: Status::default(),
            version: VersionKey::backlog(),
            priority: Priority::default(),
        }
    }

    /// Quick-add straight into a cell of the board
    pub fn quick(title: impl Into<String>, status: Status, version: impl Into<VersionKey>) -> Self {
        Self::new(title).with_status(status).with_version(version)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_version(mut self, version: impl Into<VersionKey>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for AddTask {
    type Output = Task;

    async fn execute(&self, ctx: &BoardContext) -> Result<Task> {
        let op = self.op_string();
        traced(self.span(), async {
            let title = validate_title(&self.title)?;
            validate_version(ctx, &self.version)?;

            let applied = optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    Ok(ctx.write_tasks(|store| {
                        let partition = PartitionKey::new(self.status, self.version.clone());
                        let new = NewTask {
                            title,
                            description: self.description.clone(),
                            status: self.status,
                            version_id: self.version.clone(),
                            priority: self.priority,
                            sort_order: store.next_sort_order(&partition),
                        };
                        let provisional = new.clone().into_task(TaskId::provisional());
                        let id = provisional.id.clone();
                        let revision = store.insert(provisional);
                        ((id, revision), new)
                    }))
                },
                move |new| async move { ctx.gateway().create_task(&new).await },
                |ctx, (id, _)| {
                    ctx.write_tasks(|store| store.remove(&id));
                },
            )
            .await?;

            let (provisional, revision) = applied.snapshot;
            let canonical = applied.value;
            let task = ctx
                .write_tasks(|store| store.adopt(&provisional, canonical.clone(), revision))
                .unwrap_or(canonical);

            tracing::info!(id = %task.id, partition = %task.partition(), "added task");
            Ok(task)
        })
        .await
    }
}
