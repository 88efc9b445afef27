//! GetBoard command

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::operation::{operation, Execute};
use crate::projection::{project, BoardFilter, Lane};
use crate::types::VersionKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Project the current state into lanes
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct GetBoard {
    #[serde(default)]
    pub filter: BoardFilter,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub collapsed: BTreeSet<VersionKey>,
}

operation!(GetBoard, verb = "get", noun = "board");

impl GetBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: BoardFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_collapsed(mut self, collapsed: impl IntoIterator<Item = VersionKey>) -> Self {
        self.collapsed = collapsed.into_iter().collect();
        self
    }
}

#[async_trait]
impl Execute<BoardContext, BoardError> for GetBoard {
    type Output = Vec<Lane>;

    async fn execute(&self, ctx: &BoardContext) -> Result<Vec<Lane>> {
        Ok(ctx.read_both(|registry, store| {
            project(&store.list(), &registry.list(), &self.filter, &self.collapsed)
        }))
    }
}
