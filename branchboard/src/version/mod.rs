//! Version operations

mod create;
mod delete;
mod list;
mod order;
mod rename;

pub use crate::registry::Direction;
pub use create::CreateVersion;
pub use delete::{DeleteVersion, DeletedVersion};
pub use list::ListVersions;
pub use order::{MoveVersion, SetVersionOrder};
pub use rename::RenameVersion;

use crate::error::{BoardError, Result};

/// Trimmed label, or a validation error when blank
fn validate_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(BoardError::validation("label", "must not be empty"));
    }
    Ok(label.to_string())
}
