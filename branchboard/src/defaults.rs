//! Built-in versions.
//!
//! `builtin_versions()` seeds every registry with three concrete records
//! tagged `Origin::Default`. Records loaded from the gateway are merged over
//! this seed by key, so a stored tombstone hides a built-in for good.

use crate::types::{Version, VersionKey};

/// The seeded built-ins, in canonical order
pub fn builtin_versions() -> Vec<Version> {
    vec![
        Version::builtin("v1", "Version 1", 0),
        Version::builtin("v2", "Version 2", 1),
        Version::backlog(),
    ]
}

/// The seed record for a built-in key
pub fn builtin_version(key: &VersionKey) -> Option<Version> {
    builtin_versions().into_iter().find(|v| &v.key == key)
}

/// Whether the key names a built-in
pub fn is_builtin(key: &VersionKey) -> bool {
    builtin_version(key).is_some()
}
