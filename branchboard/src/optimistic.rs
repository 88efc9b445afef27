//! Optimistic mutation: stage locally, confirm remotely, roll back on rejection.

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::gateway::GatewayResult;
use crate::notify::Notification;
use std::future::Future;

/// A confirmed mutation: what `stage` captured, plus the gateway's answer
pub(crate) struct Applied<S, T> {
    pub snapshot: S,
    pub value: T,
}

/// Run one optimistic mutation.
///
/// `stage` validates and mutates the local stores, returning a snapshot for
/// rollback and the request to send. No lock is held while `remote` runs.
/// If the gateway rejects the request, `rollback` receives the snapshot, the
/// notifier is told, and the caller gets [`BoardError::RemoteRejection`].
/// Errors from `stage` return before anything is sent.
pub(crate) async fn apply<S, Q, T, Fut>(
    ctx: &BoardContext,
    op: &str,
    stage: impl FnOnce(&BoardContext) -> Result<(S, Q)>,
    remote: impl FnOnce(Q) -> Fut,
    rollback: impl FnOnce(&BoardContext, S),
) -> Result<Applied<S, T>>
where
    Fut: Future<Output = GatewayResult<T>>,
{
    let (snapshot, request) = stage(ctx)?;

    match remote(request).await {
        Ok(value) => Ok(Applied { snapshot, value }),
        Err(source) => {
            rollback(ctx, snapshot);
            tracing::warn!(op, error = %source, "remote rejected mutation, rolled back");
            ctx.notify(Notification::warning(format!("{} failed: {}", op, source)));
            Err(BoardError::remote(op, source))
        }
    }
}
