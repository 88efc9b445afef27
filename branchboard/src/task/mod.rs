//! Task operations

mod add;
mod get;
mod list;
mod mv;
mod remove;
mod reorder;
mod update;

pub use add::AddTask;
pub use get::GetTask;
pub use list::ListTasks;
pub use mv::MoveTask;
pub use remove::RemoveTask;
pub use reorder::ReorderTask;
pub use update::UpdateTask;

use crate::context::BoardContext;
use crate::error::{BoardError, Result};
use crate::types::VersionKey;

/// Trimmed title, or a validation error when blank
fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BoardError::validation("title", "must not be empty"));
    }
    Ok(title.to_string())
}

/// A task may only point at a visible version
fn validate_version(ctx: &BoardContext, key: &VersionKey) -> Result<()> {
    if ctx.read_versions(|registry| registry.resolve(key).is_none()) {
        return Err(BoardError::validation(
            "version",
            format!("unknown version '{}'", key),
        ));
    }
    Ok(())
}
