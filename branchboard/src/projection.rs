//! Board Projection: tasks and versions to a grid of lanes.
//!
//! [`project`] is pure. It is recomputed wholesale after every mutation;
//! nothing here caches or mutates.

use crate::types::{Priority, Status, Task, Version, VersionKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Which tasks and lanes to show
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    /// Statuses to show; empty shows all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<Status>,
    /// Lanes to show; empty shows all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionKey>,
    /// Case-insensitive text matched against title and description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_priority: Option<Priority>,
}

impl BoardFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_version(mut self, version: impl Into<VersionKey>) -> Self {
        self.versions.push(version.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_min_priority(mut self, priority: Priority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether a lane for this version is shown
    pub fn shows_lane(&self, version: &VersionKey) -> bool {
        self.versions.is_empty() || self.versions.contains(version)
    }

    /// Whether a task passes the status, text and priority filters
    pub fn matches(&self, task: &Task) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if let Some(min) = self.min_priority {
            if task.priority < min {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                task.title.to_lowercase().contains(&query)
                    || task.description.to_lowercase().contains(&query)
            }
            _ => true,
        }
    }
}

/// Tasks of one status inside a lane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBucket {
    pub status: Status,
    pub tasks: Vec<Task>,
}

/// One version's row on the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    pub version: Version,
    /// Every member task, by sort_order
    pub tasks: Vec<Task>,
    /// One bucket per status, always all three, in column order
    pub buckets: Vec<StatusBucket>,
    pub collapsed: bool,
}

impl Lane {
    fn new(version: Version, collapsed: bool) -> Self {
        Self {
            version,
            tasks: Vec::new(),
            buckets: Status::ALL
                .iter()
                .map(|&status| StatusBucket {
                    status,
                    tasks: Vec::new(),
                })
                .collect(),
            collapsed,
        }
    }

    /// The bucket for a status
    pub fn bucket(&self, status: Status) -> &[Task] {
        self.buckets
            .iter()
            .find(|b| b.status == status)
            .map(|b| b.tasks.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Build the lanes for display.
///
/// `versions` is expected in canonical order (as [`crate::VersionRegistry::list`]
/// returns it); hidden records are skipped and the backlog lane always comes
/// last. Tasks pointing at a version with no visible lane land in the
/// backlog lane.
pub fn project(
    tasks: &[Task],
    versions: &[Version],
    filter: &BoardFilter,
    collapsed: &BTreeSet<VersionKey>,
) -> Vec<Lane> {
    let mut lanes: Vec<Lane> = versions
        .iter()
        .filter(|v| !v.hidden && !v.is_backlog())
        .chain(versions.iter().filter(|v| v.is_backlog()).take(1))
        .map(|v| Lane::new(v.clone(), collapsed.contains(&v.key)))
        .collect();
    if !lanes.iter().any(|lane| lane.version.is_backlog()) {
        lanes.push(Lane::new(
            Version::backlog(),
            collapsed.contains(&VersionKey::backlog()),
        ));
    }

    let index: HashMap<VersionKey, usize> = lanes
        .iter()
        .enumerate()
        .map(|(i, lane)| (lane.version.key.clone(), i))
        .collect();
    let backlog = lanes.len() - 1;

    for task in tasks.iter().filter(|t| filter.matches(t)) {
        let lane = index.get(&task.version_id).copied().unwrap_or(backlog);
        lanes[lane].tasks.push(task.clone());
    }

    for lane in &mut lanes {
        lane.tasks.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        for bucket in &mut lane.buckets {
            bucket.tasks = lane
                .tasks
                .iter()
                .filter(|t| t.status == bucket.status)
                .cloned()
                .collect();
        }
    }

    lanes.retain(|lane| filter.shows_lane(&lane.version.key));
    lanes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VersionRegistry;

    fn task(id: &str, status: Status, version: &str, order: i64) -> Task {
        Task::new(id, status, version).with_id(id).with_sort_order(order)
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn lane_keys(lanes: &[Lane]) -> Vec<&str> {
        lanes.iter().map(|l| l.version.key.as_str()).collect()
    }

    #[test]
    fn test_empty_lanes_present_and_backlog_last() {
        let versions = VersionRegistry::seeded().list();
        let lanes = project(&[], &versions, &BoardFilter::new(), &BTreeSet::new());

        assert_eq!(lane_keys(&lanes), vec!["v1", "v2", "backlog"]);
        assert!(lanes.iter().all(|l| l.buckets.len() == 3 && l.is_empty()));
    }

    #[test]
    fn test_buckets_sorted_independently() {
        let versions = VersionRegistry::seeded().list();
        let tasks = vec![
            task("d2", Status::Done, "v1", 1),
            task("t1", Status::Todo, "v1", 0),
            task("d1", Status::Done, "v1", 0),
            task("t2", Status::Todo, "v1", 1),
        ];
        let lanes = project(&tasks, &versions, &BoardFilter::new(), &BTreeSet::new());

        let v1 = &lanes[0];
        assert_eq!(v1.len(), 4);
        assert_eq!(ids(v1.bucket(Status::Todo)), vec!["t1", "t2"]);
        assert_eq!(ids(v1.bucket(Status::Done)), vec!["d1", "d2"]);
        assert!(v1.bucket(Status::InProgress).is_empty());
    }

    #[test]
    fn test_orphans_land_in_backlog() {
        let versions = VersionRegistry::seeded().list();
        let tasks = vec![task("lost", Status::Todo, "retired", 0)];
        let lanes = project(&tasks, &versions, &BoardFilter::new(), &BTreeSet::new());

        let backlog = lanes.last().unwrap();
        assert_eq!(ids(&backlog.tasks), vec!["lost"]);
    }

    #[test]
    fn test_hidden_versions_have_no_lane() {
        let mut registry = VersionRegistry::seeded();
        registry.retire(&"v2".into()).unwrap();
        let lanes = project(&[], registry.records(), &BoardFilter::new(), &BTreeSet::new());
        assert_eq!(lane_keys(&lanes), vec!["v1", "backlog"]);
    }

    #[test]
    fn test_filter() {
        let versions = VersionRegistry::seeded().list();
        let tasks = vec![
            task("a", Status::Todo, "v1", 0).with_priority(Priority::High),
            task("b", Status::Done, "v1", 0),
            Task::new("Fix typo in README", Status::Todo, "v2")
                .with_id("c")
                .with_priority(Priority::High),
        ];

        let filter = BoardFilter::new()
            .with_min_priority(Priority::High)
            .with_query("TYPO");
        let lanes = project(&tasks, &versions, &filter, &BTreeSet::new());
        let shown: Vec<&str> = lanes.iter().flat_map(|l| ids(&l.tasks)).collect();
        assert_eq!(shown, vec!["c"]);

        let filter = BoardFilter::new().with_version("v1").with_status(Status::Done);
        let lanes = project(&tasks, &versions, &filter, &BTreeSet::new());
        assert_eq!(lane_keys(&lanes), vec!["v1"]);
        assert_eq!(ids(&lanes[0].tasks), vec!["b"]);
    }

    #[test]
    fn test_collapsed_flag() {
        let versions = VersionRegistry::seeded().list();
        let collapsed: BTreeSet<VersionKey> = [VersionKey::from("v2")].into_iter().collect();
        let lanes = project(&[], &versions, &BoardFilter::new(), &collapsed);
        let flags: Vec<bool> = lanes.iter().map(|l| l.collapsed).collect();
        assert_eq!(flags, vec![false, true, false]);
    }
}
