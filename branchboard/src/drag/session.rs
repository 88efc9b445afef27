//! BoardSession: per-view state owned by the caller

use super::state::DragState;
use crate::context::BoardContext;
use crate::projection::{project, BoardFilter, Lane};
use crate::types::VersionKey;
use std::collections::BTreeSet;

/// Everything a board view needs besides the shared stores.
///
/// Passed into [`super::DragController::handle`] and handed back with the
/// new drag state, so nothing lives in globals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSession {
    pub filter: BoardFilter,
    pub collapsed: BTreeSet<VersionKey>,
    pub drag: DragState,
}

impl BoardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: BoardFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Collapse an expanded lane or expand a collapsed one.
    /// Returns whether the lane is now collapsed.
    pub fn toggle_collapsed(&mut self, version: &VersionKey) -> bool {
        if !self.collapsed.remove(version) {
            self.collapsed.insert(version.clone());
            return true;
        }
        false
    }

    pub fn is_dragging(&self) -> bool {
        !self.drag.is_idle()
    }

    /// Project the context's current state through this session's view
    pub fn lanes(&self, ctx: &BoardContext) -> Vec<Lane> {
        ctx.read_both(|registry, store| {
            project(&store.list(), &registry.list(), &self.filter, &self.collapsed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    #[test]
    fn test_toggle_collapsed() {
        let mut session = BoardSession::new();
        let v1 = VersionKey::from("v1");

        assert!(session.toggle_collapsed(&v1));
        assert!(session.collapsed.contains(&v1));
        assert!(!session.toggle_collapsed(&v1));
        assert!(session.collapsed.is_empty());
    }

    #[test]
    fn test_lanes_follow_session() {
        let ctx = BoardContext::new(MemoryGateway::new());
        let mut session = BoardSession::new().with_filter(BoardFilter::new().with_version("v2"));
        session.toggle_collapsed(&VersionKey::from("v2"));

        let lanes = session.lanes(&ctx);
        assert_eq!(lanes.len(), 1);
        assert!(lanes[0].collapsed);
        assert!(!session.is_dragging());
    }
}
