//! Version Registry: the ordered set of versions plus the backlog catch-all.
//!
//! The registry is plain in-memory state. Commands in [`crate::version`]
//! validate input, mutate the registry, and confirm through the gateway.

use crate::defaults::builtin_versions;
use crate::error::{BoardError, Result};
use crate::types::{Origin, Version, VersionKey, BACKLOG_ORDER_INDEX};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a single-step version move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(BoardError::validation(
                "direction",
                format!("expected 'up' or 'down', got '{}'", other),
            )),
        }
    }
}

/// What happened to a retired version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retirement {
    /// A built-in was hidden; the tombstone stays in the registry
    Tombstoned(Version),
    /// A custom version was removed outright
    Removed(Version),
}

impl Retirement {
    /// The record as it was before retirement
    pub fn previous(&self) -> &Version {
        match self {
            Self::Tombstoned(v) | Self::Removed(v) => v,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstoned(_))
    }
}

/// Saved order_index values, used to roll back a reorder
pub type OrderSnapshot = Vec<(VersionKey, i64)>;

/// All known versions, including hidden tombstones
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRegistry {
    versions: Vec<Version>,
}

impl Default for VersionRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

impl VersionRegistry {
    /// A registry holding only the built-ins
    pub fn seeded() -> Self {
        Self {
            versions: builtin_versions(),
        }
    }

    /// Seed the built-ins, then merge stored records over them by key
    pub fn from_records(records: impl IntoIterator<Item = Version>) -> Self {
        let mut registry = Self::seeded();
        for record in records {
            registry.upsert(record);
        }
        registry.pin_backlog();
        registry
    }

    /// Backlog is always present, visible, built-in, and outside the ordering
    fn pin_backlog(&mut self) {
        match self.versions.iter_mut().find(|v| v.is_backlog()) {
            Some(backlog) => {
                backlog.hidden = false;
                backlog.origin = Origin::Default;
                backlog.order_index = BACKLOG_ORDER_INDEX;
            }
            None => self.versions.push(Version::backlog()),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All visible versions in canonical order, backlog last
    pub fn list(&self) -> Vec<Version> {
        let mut ordered: Vec<&Version> = self.versions.iter().filter(|v| v.is_orderable()).collect();
        ordered.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut list: Vec<Version> = ordered.into_iter().cloned().collect();
        if let Some(backlog) = self.versions.iter().find(|v| v.is_backlog()) {
            list.push(backlog.clone());
        }
        list
    }

    /// Keys of visible non-backlog versions in canonical order
    pub fn ordered_keys(&self) -> Vec<VersionKey> {
        self.list()
            .into_iter()
            .filter(|v| !v.is_backlog())
            .map(|v| v.key)
            .collect()
    }

    /// Every record, hidden tombstones included
    pub fn records(&self) -> &[Version] {
        &self.versions
    }

    /// Look up a record by key, hidden or not
    pub fn get(&self, key: &VersionKey) -> Option<&Version> {
        self.versions.iter().find(|v| &v.key == key)
    }

    /// Look up a visible version by key
    pub fn resolve(&self, key: &VersionKey) -> Option<&Version> {
        self.get(key).filter(|v| !v.hidden)
    }

    /// order_index for a version appended just before the backlog
    pub fn next_order_index(&self) -> i64 {
        self.versions
            .iter()
            .filter(|v| v.is_orderable())
            .map(|v| v.order_index)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Clamp a requested ordering to the visible non-backlog keys.
    ///
    /// Backlog, unknown and repeated keys are dropped. Visible keys the
    /// request omits keep their relative order after the listed ones.
    pub fn normalized_order(&self, requested: &[VersionKey]) -> Vec<VersionKey> {
        let visible = self.ordered_keys();
        let mut order: Vec<VersionKey> = Vec::with_capacity(visible.len());

        for key in requested {
            if visible.contains(key) && !order.contains(key) {
                order.push(key.clone());
            }
        }
        for key in visible {
            if !order.contains(&key) {
                order.push(key);
            }
        }
        order
    }

    /// The ordering after moving `key` one step, or `None` at a boundary
    pub fn stepped_order(
        &self,
        key: &VersionKey,
        direction: Direction,
    ) -> Result<Option<Vec<VersionKey>>> {
        if key.is_backlog() {
            return Err(BoardError::constraint("the backlog cannot be repositioned"));
        }

        let mut order = self.ordered_keys();
        let pos = order
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| BoardError::stale("version", key))?;

        let swap_with = match direction {
            Direction::Up if pos == 0 => return Ok(None),
            Direction::Up => pos - 1,
            // The last orderable version sits directly above the backlog
            Direction::Down if pos + 1 == order.len() => return Ok(None),
            Direction::Down => pos + 1,
        };
        order.swap(pos, swap_with);
        Ok(Some(order))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert or replace a record by key
    pub fn upsert(&mut self, version: Version) {
        match self.versions.iter_mut().find(|v| v.key == version.key) {
            Some(existing) => *existing = version,
            None => self.versions.push(version),
        }
    }

    /// Insert a new record; the key must be unused
    pub fn insert(&mut self, version: Version) -> Result<()> {
        if self.get(&version.key).is_some() {
            return Err(BoardError::constraint(format!(
                "version key '{}' already exists",
                version.key
            )));
        }
        self.versions.push(version);
        Ok(())
    }

    /// Remove a record outright
    pub fn remove(&mut self, key: &VersionKey) -> Option<Version> {
        let pos = self.versions.iter().position(|v| &v.key == key)?;
        Some(self.versions.remove(pos))
    }

    /// Replace the record under `old` with a canonical record that may carry
    /// a different key
    pub fn rekey(&mut self, old: &VersionKey, canonical: Version) {
        self.remove(old);
        self.upsert(canonical);
    }

    /// Change a visible version's label, returning the previous label
    pub fn set_label(&mut self, key: &VersionKey, label: &str) -> Result<String> {
        if key.is_backlog() {
            return Err(BoardError::constraint("the backlog cannot be renamed"));
        }
        let version = self
            .versions
            .iter_mut()
            .find(|v| &v.key == key && !v.hidden)
            .ok_or_else(|| BoardError::stale("version", key))?;
        Ok(std::mem::replace(&mut version.label, label.to_string()))
    }

    /// Current order_index of every record
    pub fn order_snapshot(&self) -> OrderSnapshot {
        self.versions
            .iter()
            .map(|v| (v.key.clone(), v.order_index))
            .collect()
    }

    /// Put back order_index values captured by [`Self::order_snapshot`]
    pub fn restore_order(&mut self, snapshot: &OrderSnapshot) {
        for (key, order_index) in snapshot {
            if let Some(v) = self.versions.iter_mut().find(|v| &v.key == key) {
                v.order_index = *order_index;
            }
        }
    }

    /// Assign order_index 0..n-1 following `order`. Expects a normalized order.
    pub fn apply_order(&mut self, order: &[VersionKey]) {
        for (index, key) in order.iter().enumerate() {
            if let Some(v) = self
                .versions
                .iter_mut()
                .find(|v| &v.key == key && !v.is_backlog())
            {
                v.order_index = index as i64;
            }
        }
    }

    /// Retire a version: built-ins become hidden tombstones, custom versions
    /// are removed.
    pub fn retire(&mut self, key: &VersionKey) -> Result<Retirement> {
        if key.is_backlog() {
            return Err(BoardError::constraint("the backlog cannot be deleted"));
        }
        let pos = self
            .versions
            .iter()
            .position(|v| &v.key == key && !v.hidden)
            .ok_or_else(|| BoardError::stale("version", key))?;

        if self.versions[pos].is_builtin() {
            let previous = self.versions[pos].clone();
            self.versions[pos].hidden = true;
            Ok(Retirement::Tombstoned(previous))
        } else {
            Ok(Retirement::Removed(self.versions.remove(pos)))
        }
    }
}
