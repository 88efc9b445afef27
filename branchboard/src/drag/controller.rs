//! DragController: turns drag events into moves

use super::session::BoardSession;
use super::state::{DragEvent, DropIntent};
use crate::context::BoardContext;
use crate::error::BoardError;
use crate::operation::Execute;
use crate::task::MoveTask;
use crate::types::Task;

/// What an event did
#[derive(Debug)]
pub enum DragOutcome {
    /// The drag is still in progress
    Pending,
    /// A start arrived while another drag was active, or an event arrived
    /// with no drag active
    Ignored,
    /// Cancelled, or dropped outside every zone. Nothing was sent.
    Cancelled,
    /// Dropped where the task already was
    NoChange,
    Moved(Task),
    /// The dragged task, drop target or lane no longer exists
    Stale,
    /// The move failed and was rolled back
    Rejected(BoardError),
}

impl DragOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// Drives [`super::DragState`] and performs the move on drop
#[derive(Debug, Default, Clone, Copy)]
pub struct DragController;

impl DragController {
    pub fn new() -> Self {
        Self
    }

    /// Feed one event.
    ///
    /// Never fails: rejections were already rolled back and surfaced through
    /// the notifier, and stale references are reported as
    /// [`DragOutcome::Stale`].
    pub async fn handle(
        &self,
        ctx: &BoardContext,
        mut session: BoardSession,
        event: DragEvent,
    ) -> (BoardSession, DragOutcome) {
        if let DragEvent::Start { task } = &event {
            if session.drag.is_idle() && ctx.task(task).is_none() {
                tracing::debug!(id = %task, "drag start on missing task");
                return (session, DragOutcome::Stale);
            }
        }

        let was_idle = session.drag.is_idle();
        let (next, intent) = std::mem::take(&mut session.drag).on(&event);
        let ignored = match &event {
            DragEvent::Start { .. } => !was_idle,
            _ => was_idle,
        };
        session.drag = next;

        let outcome = match intent {
            Some(intent) => self.perform_drop(ctx, intent).await,
            None if ignored => {
                tracing::debug!(?event, "drag event ignored");
                DragOutcome::Ignored
            }
            None if session.drag.is_idle() => {
                tracing::debug!(?event, "drag cancelled");
                DragOutcome::Cancelled
            }
            None => DragOutcome::Pending,
        };
        (session, outcome)
    }

    async fn perform_drop(&self, ctx: &BoardContext, intent: DropIntent) -> DragOutcome {
        let mut command = MoveTask::new(
            intent.task.clone(),
            intent.cell.status,
            intent.cell.version.clone(),
        );
        if let Some(before) = intent.before() {
            command = command.with_before(before.clone());
        }

        match command.execute(ctx).await {
            Ok(Some(task)) => DragOutcome::Moved(task),
            Ok(None) => DragOutcome::NoChange,
            Err(e) if e.is_stale() => DragOutcome::Stale,
            Err(e) => {
                if !e.is_absorbed() {
                    tracing::warn!(error = %e, cell = %intent.cell, "drop failed");
                }
                DragOutcome::Rejected(e)
            }
        }
    }
}
