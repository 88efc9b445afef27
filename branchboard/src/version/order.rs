//! SetVersionOrder and MoveVersion commands

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::registry::Direction;
use crate::types::{Version, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Replace the full ordering of the non-backlog versions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetVersionOrder {
    /// Keys in the wanted order. Backlog, unknown and repeated keys are
    /// ignored; visible keys left out keep their relative order at the end.
    pub keys: Vec<VersionKey>,
}

operation!(SetVersionOrder, verb = "order", noun = "versions");

impl SetVersionOrder {
    pub fn new(keys: impl IntoIterator<Item = impl Into<VersionKey>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for SetVersionOrder {
    type Output = Vec<Version>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Vec<Version>> {
        let order = ctx.read_versions(|registry| registry.normalized_order(&self.keys));
        traced(self.span(), reorder(ctx, &self.op_string(), order)).await
    }
}

/// Move one version a single step up or down
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveVersion {
    pub key: VersionKey,
    pub direction: Direction,
}

operation!(MoveVersion, verb = "move", noun = "version");

impl MoveVersion {
    pub fn new(key: impl Into<VersionKey>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn up(key: impl Into<VersionKey>) -> Self {
        Self::new(key, Direction::Up)
    }

    pub fn down(key: impl Into<VersionKey>) -> Self {
        Self::new(key, Direction::Down)
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for MoveVersion {
    type Output = Vec<Version>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Vec<Version>> {
        traced(self.span(), async {
            let stepped =
                ctx.read_versions(|registry| registry.stepped_order(&self.key, self.direction))?;
            match stepped {
                Some(order) => reorder(ctx, &self.op_string(), order).await,
                None => {
                    tracing::debug!(key = %self.key, direction = ?self.direction, "already at boundary");
                    Ok(ctx.versions())
                }
            }
        })
        .await
    }
}

/// Apply a normalized order locally, then persist it
async fn reorder(ctx: &BoardContext, op: &str, order: Vec<VersionKey>) -> Result<Vec<Version>> {
    if ctx.read_versions(|registry| registry.ordered_keys()) == order {
        tracing::debug!("version order unchanged");
        return Ok(ctx.versions());
    }

    optimistic::apply(
        ctx,
        op,
        |ctx| {
            let snapshot = ctx.write_versions(|registry| {
                let snapshot = registry.order_snapshot();
                registry.apply_order(&order);
                snapshot
            });
            Ok((snapshot, &order))
        },
        |keys| async move { ctx.gateway().reorder_versions(keys).await },
        |ctx, snapshot| ctx.write_versions(|registry| registry.restore_order(&snapshot)),
    )
    .await?;

    tracing::info!(count = order.len(), "reordered versions");
    Ok(ctx.versions())
}
