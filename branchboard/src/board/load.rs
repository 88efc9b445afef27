//! LoadBoard command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::notify::Notification;
use crate::operation::{operation, traced, Execute, Operation};
use crate::registry::VersionRegistry;
use crate::store::TaskStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Replace the local state with what the gateway holds.
///
/// A failed `list_versions` falls back to the built-in versions and marks the
/// load as degraded. A failed `list_tasks` fails the load and leaves the
/// current state untouched.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct LoadBoard;

operation!(LoadBoard, verb = "load", noun = "board");

impl LoadBoard {
    pub fn new() -> Self {
        Self
    }
}

/// What a load brought in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    /// Visible versions, backlog included
    pub versions: usize,
    pub tasks: usize,
    /// Versions could not be listed; the built-ins stand in
    pub degraded: bool,
}

#[async_trait]
impl Execute<BoardContext, BoardError> for LoadBoard {
    type Output = BoardSummary;

    async fn execute(&self, ctx: &BoardContext) -> Result<BoardSummary> {
        let op = self.op_string();
        traced(self.span(), async {
            let (registry, degraded) = match ctx.gateway().list_versions().await {
                Ok(records) => (VersionRegistry::from_records(records), false),
                Err(e) => {
                    tracing::warn!(error = %e, "could not list versions, using built-ins");
                    ctx.notify(Notification::warning(format!(
                        "Versions unavailable, showing defaults: {}",
                        e
                    )));
                    (VersionRegistry::seeded(), true)
                }
            };

            let tasks = match ctx.gateway().list_tasks().await {
                Ok(tasks) => tasks,
                Err(e) => {
                    ctx.notify(Notification::error(format!("{} failed: {}", op, e)));
                    return Err(BoardError::remote(op.as_str(), e));
                }
            };

            let store = TaskStore::from_tasks(tasks);
            let summary = BoardSummary {
                versions: registry.list().len(),
                tasks: store.len(),
                degraded,
            };
            ctx.replace(registry, store);

            tracing::info!(
                versions = summary.versions,
                tasks = summary.tasks,
                degraded,
                "loaded board"
            );
            Ok(summary)
        })
        .await
    }
}
