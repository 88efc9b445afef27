//! RenameVersion command

use super::validate_label;
use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::types::{Version, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Change a version's label
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenameVersion {
    pub key: VersionKey,
    pub label: String,
}

operation!(RenameVersion, verb = "rename", noun = "version");

impl RenameVersion {
    pub fn new(key: impl Into<VersionKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for RenameVersion {
    type Output = Version;

    async fn execute(&self, ctx: &BoardContext) -> Result<Version> {
        let op = self.op_string();
        traced(self.span(), async {
            if self.key.is_backlog() {
                return Err(BoardError::constraint("the backlog cannot be renamed"));
            }
            let label = validate_label(&self.label)?;
            let label = label.as_str();

            let applied = optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    let previous =
                        ctx.write_versions(|registry| registry.set_label(&self.key, label))?;
                    Ok((previous, ()))
                },
                move |()| async move { ctx.gateway().update_version(&self.key, label).await },
                |ctx, previous| {
                    // The version may have been deleted meanwhile
                    if ctx
                        .write_versions(|registry| registry.set_label(&self.key, &previous))
                        .is_err()
                    {
                        tracing::warn!(key = %self.key, "version gone, label rollback skipped");
                    }
                },
            )
            .await?;

            let canonical = applied.value;
            ctx.write_versions(|registry| registry.set_label(&self.key, &canonical.label))?;
            tracing::info!(key = %self.key, label = %canonical.label, "renamed version");
            Ok(canonical)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use crate::version::CreateVersion;
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryGateway>, BoardContext) {
        let gateway = Arc::new(MemoryGateway::new());
        let ctx = BoardContext::from_shared(gateway.clone());
        (gateway, ctx)
    }

    fn label_of(ctx: &BoardContext, key: &str) -> String {
        ctx.read_versions(|r| r.get(&key.into()).unwrap().label.clone())
    }

    #[tokio::test]
    async fn test_rename_builtin() {
        let (gateway, ctx) = setup();
        let renamed = RenameVersion::new("v1", "Alpha").execute(&ctx).await.unwrap();

        assert_eq!(renamed.label, "Alpha");
        assert_eq!(label_of(&ctx, "v1"), "Alpha");
        assert_eq!(gateway.call_count(GatewayOp::UpdateVersion), 1);
    }

    #[tokio::test]
    async fn test_rename_custom() {
        let (_gateway, ctx) = setup();
        let created = CreateVersion::new("Beta").execute(&ctx).await.unwrap();
        RenameVersion::new(created.key.clone(), "Gamma")
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(label_of(&ctx, created.key.as_str()), "Gamma");
    }

    #[tokio::test]
    async fn test_backlog_is_constraint_before_validation() {
        let (gateway, ctx) = setup();
        let result = RenameVersion::new(VersionKey::backlog(), "").execute(&ctx).await;
        assert!(matches!(result, Err(BoardError::Constraint { .. })));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_label() {
        let (_gateway, ctx) = setup();
        let result = RenameVersion::new("v1", " ").execute(&ctx).await;
        assert!(matches!(result, Err(BoardError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unknown_key_is_stale() {
        let (gateway, ctx) = setup();
        let result = RenameVersion::new("ghost", "Boo").execute(&ctx).await;
        assert!(result.unwrap_err().is_stale());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_restores_label() {
        let (gateway, ctx) = setup();
        gateway.fail(GatewayOp::UpdateVersion);

        let result = RenameVersion::new("v2", "Nope").execute(&ctx).await;
        assert!(matches!(result, Err(BoardError::RemoteRejection { .. })));
        assert_eq!(label_of(&ctx, "v2"), "Version 2");
    }
}
