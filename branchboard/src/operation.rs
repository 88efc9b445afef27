//! Command traits.
//!
//! Commands are structs whose fields are their parameters. Each one names
//! itself with a verb and a noun, and runs against a context through
//! [`Execute`].

use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use tracing::{Instrument, Span};

/// Metadata every command carries
pub trait Operation {
    /// The action, e.g. "move"
    fn verb(&self) -> &'static str;

    /// The entity acted on, e.g. "task"
    fn noun(&self) -> &'static str;

    /// Canonical op string, e.g. "move task". Used for spans and messages.
    fn op_string(&self) -> String {
        format!("{} {}", self.verb(), self.noun())
    }

    /// Span every execution runs in
    fn span(&self) -> Span {
        tracing::info_span!("command", op = %self.op_string())
    }
}

/// Run a command against a context
#[async_trait]
pub trait Execute<C, E>: Operation
where
    C: Sync,
{
    type Output: Send;

    async fn execute(&self, ctx: &C) -> std::result::Result<Self::Output, E>;
}

/// Implement [`Operation`] for a command struct
macro_rules! operation {
    ($ty:ty, verb = $verb:literal, noun = $noun:literal) => {
        impl $crate::operation::Operation for $ty {
            fn verb(&self) -> &'static str {
                $verb
            }

            fn noun(&self) -> &'static str {
                $noun
            }
        }
    };
}

pub(crate) use operation;

/// Run a command body inside its span. Stale references are logged at debug
/// level; they leave the board untouched.
pub(crate) async fn traced<T>(span: Span, body: impl Future<Output = Result<T>>) -> Result<T> {
    let result = body.instrument(span.clone()).await;
    if let Err(err) = &result {
        span.in_scope(|| {
            if err.is_stale() {
                tracing::debug!(error = %err, "stale reference, nothing changed");
            } else {
                tracing::debug!(error = %err, "command failed");
            }
        });
    }
    result
}
