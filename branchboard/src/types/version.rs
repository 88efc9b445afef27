//! Version types: Version, Origin, NewVersion

use super::ids::VersionKey;
use serde::{Deserialize, Serialize};

/// Stored order_index of the backlog. Backlog never takes part in ordering
/// comparisons; the value only keeps serialized records stable.
pub const BACKLOG_ORDER_INDEX: i64 = i64::MAX;

/// Where a version record came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Seeded built-in
    Default,
    /// Created by the user
    #[default]
    Custom,
}

/// A named, orderable grouping of tasks (a release or iteration)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub key: VersionKey,
    pub label: String,
    /// Position among non-backlog versions
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub origin: Origin,
    /// Soft-deleted built-in. Hidden versions never appear in listings.
    #[serde(default)]
    pub hidden: bool,
}

impl Version {
    /// A seeded built-in version
    pub fn builtin(key: impl Into<VersionKey>, label: impl Into<String>, order_index: i64) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order_index,
            origin: Origin::Default,
            hidden: false,
        }
    }

    /// A user-created version
    pub fn custom(key: impl Into<VersionKey>, label: impl Into<String>, order_index: i64) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order_index,
            origin: Origin::Custom,
            hidden: false,
        }
    }

    /// The permanent catch-all version
    pub fn backlog() -> Self {
        Self::builtin(VersionKey::backlog(), "Backlog", BACKLOG_ORDER_INDEX)
    }

    pub fn is_backlog(&self) -> bool {
        self.key.is_backlog()
    }

    pub fn is_builtin(&self) -> bool {
        self.origin == Origin::Default
    }

    /// Visible and not the backlog: the versions that take part in ordering
    pub fn is_orderable(&self) -> bool {
        !self.hidden && !self.is_backlog()
    }

    /// The hidden marker written when a built-in is deleted
    pub fn tombstone(&self) -> Self {
        Self {
            hidden: true,
            ..self.clone()
        }
    }
}

/// Fields sent to the gateway when creating a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVersion {
    pub key: VersionKey,
    pub label: String,
    pub order_index: i64,
}

impl NewVersion {
    /// The canonical custom record for these fields
    pub fn into_version(self) -> Version {
        Version::custom(self.key, self.label, self.order_index)
    }
}

impl From<&Version> for NewVersion {
    fn from(version: &Version) -> Self {
        Self {
            key: version.key.clone(),
            label: version.label.clone(),
            order_index: version.order_index,
        }
    }
}
