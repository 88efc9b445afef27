//! ListVersions command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, Execute};
use crate::types::Version;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// List versions in canonical order, backlog last
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ListVersions {
    /// Also return hidden tombstones, after the visible versions
    #[serde(default)]
    pub include_hidden: bool,
}

operation!(ListVersions, verb = "list", noun = "versions");

impl ListVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for ListVersions {
    type Output = Vec<Version>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Vec<Version>> {
        Ok(ctx.read_versions(|registry| {
            let mut versions = registry.list();
            if self.include_hidden {
                let mut hidden: Vec<Version> = registry
                    .records()
                    .iter()
                    .filter(|v| v.hidden)
                    .cloned()
                    .collect();
                hidden.sort_by(|a, b| a.key.cmp(&b.key));
                versions.extend(hidden);
            }
            versions
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::version::DeleteVersion;

    #[tokio::test]
    async fn test_list_hides_tombstones_unless_asked() {
        let ctx = BoardContext::new(MemoryGateway::new());
        DeleteVersion::to_backlog("v1").execute(&ctx).await.unwrap();

        let visible = ListVersions::new().execute(&ctx).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.last().unwrap().is_backlog());

        let all = ListVersions::new().with_hidden(true).execute(&ctx).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[2].hidden);
    }
}
