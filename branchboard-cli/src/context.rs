//! Board context construction for CLI commands

use crate::config::BoardConfig;
use anyhow::{Context, Result};
use branchboard::board::LoadBoard;
use branchboard::{
    BoardContext, Execute, FileGateway, Notification, NotificationLevel, Notifier, SyncGateway,
};
use std::sync::Arc;

/// Prints notifications to stderr, where a terminal user sees them
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        let prefix = match notification.level {
            NotificationLevel::Info => "note",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        eprintln!("{}: {}", prefix, notification.message);
    }
}

/// Open the board stored under the configured data directory
pub async fn open_board(config: &BoardConfig) -> Result<BoardContext> {
    let gateway = FileGateway::new(config.data_dir.clone());
    gateway
        .ensure_directories()
        .await
        .with_context(|| format!("cannot create {}", config.data_dir.display()))?;
    load(Arc::new(gateway)).await
}

/// Load a board over any gateway
pub async fn load(gateway: Arc<dyn SyncGateway>) -> Result<BoardContext> {
    let ctx = BoardContext::from_shared(gateway).with_notifier(Arc::new(StderrNotifier));
    let summary = LoadBoard::new()
        .execute(&ctx)
        .await
        .context("cannot load board")?;
    tracing::debug!(
        tasks = summary.tasks,
        versions = summary.versions,
        "board opened"
    );
    Ok(ctx)
}
