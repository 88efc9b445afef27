//! CreateVersion command

use super::validate_label;
use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, traced, Execute, Operation};
use crate::optimistic;
use crate::types::{NewVersion, Version, VersionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Create a version just before the backlog
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateVersion {
    /// Display label (required)
    pub label: String,
    /// Explicit key. A `custom-<ulid>` key is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<VersionKey>,
}

operation!(CreateVersion, verb = "create", noun = "version");

impl CreateVersion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<VersionKey>) -> Self {
        self.key = Some(key.into());
        self
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for CreateVersion {
    type Output = Version;

    async fn execute(&self, ctx: &BoardContext) -> Result<Version> {
        let op = self.op_string();
        traced(self.span(), async {
            let label = validate_label(&self.label)?;
            if let Some(key) = &self.key {
                if key.as_str().trim().is_empty() {
                    return Err(BoardError::validation("key", "must not be empty"));
                }
            }

            let applied = optimistic::apply(
                ctx,
                &op,
                |ctx| {
                    ctx.write_versions(|registry| -> Result<(VersionKey, NewVersion)> {
                        let key = self.key.clone().unwrap_or_else(VersionKey::generate);
                        let version = Version::custom(key, label, registry.next_order_index());
                        registry.insert(version.clone())?;
                        Ok((version.key.clone(), NewVersion::from(&version)))
                    })
                },
                move |request| async move { ctx.gateway().create_version(&request).await },
                |ctx, key| {
                    ctx.write_versions(|registry| registry.remove(&key));
                },
            )
            .await?;

            // The gateway's record is canonical, key included
            let local_key = applied.snapshot;
            let canonical = applied.value;
            ctx.write_both(|registry, tasks| {
                if canonical.key != local_key {
                    tasks.rekey_version(&local_key, &canonical.key);
                }
                registry.rekey(&local_key, canonical.clone());
            });

            tracing::info!(key = %canonical.key, label = %canonical.label, "created version");
            Ok(canonical)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryGateway>, BoardContext) {
        let gateway = Arc::new(MemoryGateway::new());
        let ctx = BoardContext::from_shared(gateway.clone());
        (gateway, ctx)
    }

    fn labels(ctx: &BoardContext) -> Vec<String> {
        ctx.versions().into_iter().map(|v| v.label).collect()
    }

    #[tokio::test]
    async fn test_create_inserts_before_backlog() {
        let (gateway, ctx) = setup();

        let created = CreateVersion::new("Sprint 7").execute(&ctx).await.unwrap();

        assert!(created.key.as_str().starts_with("custom-"));
        assert_eq!(created.order_index, 2);
        assert_eq!(
            labels(&ctx),
            vec!["Version 1", "Version 2", "Sprint 7", "Backlog"]
        );
        assert_eq!(gateway.stored_versions(), vec![created]);
    }

    #[tokio::test]
    async fn test_create_trims_label() {
        let (_gateway, ctx) = setup();
        let created = CreateVersion::new("  Beta  ").execute(&ctx).await.unwrap();
        assert_eq!(created.label, "Beta");
    }

    #[tokio::test]
    async fn test_blank_label_is_validation_error() {
        let (gateway, ctx) = setup();
        let result = CreateVersion::new("   ").execute(&ctx).await;
        assert!(matches!(result, Err(BoardError::Validation { .. })));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_key_is_constraint() {
        let (gateway, ctx) = setup();
        let result = CreateVersion::new("Again").with_key("v1").execute(&ctx).await;
        assert!(matches!(result, Err(BoardError::Constraint { .. })));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_removes_local_version() {
        let (gateway, ctx) = setup();
        gateway.fail(GatewayOp::CreateVersion);

        let result = CreateVersion::new("Doomed").execute(&ctx).await;
        assert!(matches!(result, Err(BoardError::RemoteRejection { .. })));
        assert_eq!(labels(&ctx), vec!["Version 1", "Version 2", "Backlog"]);
    }
}
