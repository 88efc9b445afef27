//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Task identifier. Canonical ids are assigned by the sync gateway; a task
    /// created locally carries a provisional id until the gateway answers.
    TaskId
);

define_id!(
    /// Version key. Built-ins use fixed literals (`v1`, `v2`, `backlog`),
    /// custom versions get a generated key.
    VersionKey
);

const PROVISIONAL_PREFIX: &str = "tmp-";
const CUSTOM_PREFIX: &str = "custom-";

impl TaskId {
    /// A fresh canonical id (ULID)
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// A local placeholder used until the gateway assigns the canonical id
    pub fn provisional() -> Self {
        Self(format!("{}{}", PROVISIONAL_PREFIX, Ulid::new()))
    }

    /// Whether this id is still a local placeholder
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionKey {
    /// Key of the permanent catch-all version
    pub const BACKLOG: &'static str = "backlog";

    /// The backlog key
    pub fn backlog() -> Self {
        Self(Self::BACKLOG.to_string())
    }

    /// Allocate a new unique key for a custom version
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            CUSTOM_PREFIX,
            Ulid::new().to_string().to_lowercase()
        ))
    }

    /// Whether this is the backlog key
    pub fn is_backlog(&self) -> bool {
        self.0 == Self::BACKLOG
    }
}

impl Default for VersionKey {
    fn default() -> Self {
        Self::backlog()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_new_is_ulid() {
        let id = TaskId::new();
        assert_eq!(id.as_str().len(), 26);
        assert!(!id.is_provisional());
    }

    #[test]
    fn test_provisional_ids_are_unique() {
        let a = TaskId::provisional();
        let b = TaskId::provisional();
        assert!(a.is_provisional());
        assert_ne!(a, b);
    }

    #[test]
    fn test_version_key_backlog() {
        assert!(VersionKey::backlog().is_backlog());
        assert!(VersionKey::default().is_backlog());
        assert!(!VersionKey::from("v1").is_backlog());
    }

    #[test]
    fn test_generated_version_keys() {
        let key = VersionKey::generate();
        assert!(key.as_str().starts_with("custom-"));
        assert_eq!(key.as_str(), key.as_str().to_lowercase());
        assert_ne!(key, VersionKey::generate());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = TaskId::from_string("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
