//! DeleteVersion command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::registry::Retirement;
use crate::store::TaskSnapshot;
use crate::types::{TaskId, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Delete a version, re-pointing its tasks to another version.
///
/// Built-ins become hidden tombstones so they do not come back as defaults
/// on the next load. Custom versions are removed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteVersion {
    pub key: VersionKey,
    /// Version that receives the deleted version's tasks
    pub reassign_to: VersionKey,
}

operation!(DeleteVersion, verb = "delete", noun = "version");

impl DeleteVersion {
    pub fn new(key: impl Into<VersionKey>, reassign_to: impl Into<VersionKey>) -> Self {
        Self {
            key: key.into(),
            reassign_to: reassign_to.into(),
        }
    }

    /// Delete and move the tasks to the backlog
    pub fn to_backlog(key: impl Into<VersionKey>) -> Self {
        Self::new(key, VersionKey::backlog())
    }
}

/// Result of a version deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedVersion {
    pub key: VersionKey,
    pub reassigned_to: VersionKey,
    /// Tasks that moved, in their new order
    pub reassigned: Vec<TaskId>,
    /// True when a built-in was hidden rather than removed
    pub tombstoned: bool,
}

#[async_trait]
impl Execute<BoardContext, BoardError> for DeleteVersion {
    type Output = DeletedVersion;

    async fn execute(&self, ctx: &BoardContext) -> Result<DeletedVersion> {
        let op = self.op_string();
        traced(self.span(), async {
            if self.key.is_backlog() {
                return Err(BoardError::constraint("the backlog cannot be deleted"));
            }
            if self.key == self.reassign_to {
                return Err(BoardError::constraint(
                    "a version cannot be reassigned to itself",
                ));
            }

            let applied = optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    ctx.write_both(
                        |registry, tasks| -> Result<((Retirement, Vec<TaskSnapshot>), ())> {
                            if registry.resolve(&self.key).is_none() {
                                return Err(BoardError::stale("version", &self.key));
                            }
                            if registry.resolve(&self.reassign_to).is_none() {
                                return Err(BoardError::validation(
                                    "reassign_to",
                                    format!("unknown version '{}'", self.reassign_to),
                                ));
                            }
                            let retirement = registry.retire(&self.key)?;
                            let moved = tasks.reassign_version(&self.key, &self.reassign_to);
                            Ok(((retirement, moved), ()))
                        },
                    )
                },
                move |()| async move {
                    ctx.gateway()
                        .delete_version(&self.key, &self.reassign_to)
                        .await
                },
                |ctx, (retirement, moved)| {
                    let skipped = ctx.write_both(|registry, tasks| {
                        registry.upsert(retirement.previous().clone());
                        let mut skipped = 0;
                        for snapshot in moved {
                            if !tasks.restore(snapshot) {
                                skipped += 1;
                            }
                        }
                        skipped
                    });
                    if skipped > 0 {
                        tracing::warn!(skipped, "newer local changes kept during rollback");
                    }
                },
            )
            .await?;

            let (retirement, moved) = applied.snapshot;
            let deleted = DeletedVersion {
                key: self.key.clone(),
                reassigned_to: self.reassign_to.clone(),
                reassigned: moved.into_iter().map(|s| s.previous.id).collect(),
                tombstoned: retirement.is_tombstone(),
            };
            tracing::info!(
                key = %deleted.key,
                reassigned = deleted.reassigned.len(),
                tombstoned = deleted.tombstoned,
                "deleted version"
            );
            Ok(deleted)
        })
        .await
    }
}
