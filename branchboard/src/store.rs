//! Task Store: the in-memory task collection and per-partition ordering.
//!
//! Every mutation stamps the touched records with a fresh revision from a
//! store-wide counter. Rollbacks carry the revision their own mutation
//! produced and only restore a record that still holds it, so a rollback
//! never clobbers a newer local change.

use crate::error::{BoardError, Result};
use crate::types::{PartitionKey, Status, Task, TaskId, TaskPatch, VersionKey};
use chrono::Utc;
use std::collections::HashMap;

/// A record as it was before a mutation, plus the revision the mutation produced
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub previous: Task,
    pub revision: u64,
}

/// Saved sort orders of a partition before a reorder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSnapshot {
    entries: Vec<(TaskId, Option<i64>, u64)>,
}

impl OrderSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All tasks known locally
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: HashMap<TaskId, Task>,
    next_revision: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded records
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::new();
        for task in tasks {
            store.insert(task);
        }
        store
    }

    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// All tasks, grouped by version then status, each partition in order
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| {
            a.version_id
                .cmp(&b.version_id)
                .then_with(|| a.status.cmp(&b.status))
                .then_with(|| a.sort_key().cmp(&b.sort_key()))
        });
        tasks.into_iter().cloned().collect()
    }

    /// Members of a partition sorted by sort_order
    pub fn partition(&self, key: &PartitionKey) -> Vec<&Task> {
        let mut members: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.in_partition(key))
            .collect();
        members.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        members
    }

    /// Member ids of a partition in order
    pub fn partition_ids(&self, key: &PartitionKey) -> Vec<TaskId> {
        self.partition(key).into_iter().map(|t| t.id.clone()).collect()
    }

    /// Number of tasks pointing at a version, across all statuses
    pub fn count_in_version(&self, version: &VersionKey) -> usize {
        self.tasks
            .values()
            .filter(|t| &t.version_id == version)
            .count()
    }

    /// sort_order for a task appended to the partition: max + 1, or 0 if empty
    pub fn next_sort_order(&self, key: &PartitionKey) -> i64 {
        self.tasks
            .values()
            .filter(|t| t.in_partition(key))
            .filter_map(|t| t.sort_order)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// The partition order after moving `moved` before `before`.
    ///
    /// The moved task is taken out first and the target's index is looked up
    /// in the reduced list. With no target, or a target outside the
    /// partition, the moved task goes to the end.
    pub fn plan_reorder(
        &self,
        moved: &TaskId,
        before: Option<&TaskId>,
        key: &PartitionKey,
    ) -> Result<Vec<TaskId>> {
        let mut ids = self.partition_ids(key);
        if !ids.contains(moved) {
            return Err(BoardError::stale("task", moved));
        }
        ids.retain(|id| id != moved);

        let index = match before {
            Some(target) => ids
                .iter()
                .position(|id| id == target)
                .unwrap_or(ids.len()),
            None => ids.len(),
        };
        ids.insert(index, moved.clone());
        Ok(ids)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert or replace a record, returning its new revision
    pub fn insert(&mut self, mut task: Task) -> u64 {
        let revision = self.bump();
        task.revision = revision;
        self.tasks.insert(task.id.clone(), task);
        revision
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        self.tasks.remove(id)
    }

    /// Put a removed record back, unless something took its id meanwhile
    pub fn reinstate(&mut self, task: Task) -> bool {
        if self.tasks.contains_key(&task.id) {
            return false;
        }
        self.tasks.insert(task.id.clone(), task);
        true
    }

    /// Apply a patch to every field at once
    pub fn patch(&mut self, id: &TaskId, patch: &TaskPatch) -> Option<TaskSnapshot> {
        let revision = self.bump();
        let task = self.tasks.get_mut(id)?;
        let previous = task.clone();
        patch.apply_to(task);
        task.revision = revision;
        Some(TaskSnapshot { previous, revision })
    }

    /// Restore a snapshot if the record still holds the snapshot's revision
    pub fn restore(&mut self, snapshot: TaskSnapshot) -> bool {
        match self.tasks.get_mut(&snapshot.previous.id) {
            Some(current) if current.revision == snapshot.revision => {
                *current = snapshot.previous;
                true
            }
            _ => false,
        }
    }

    /// Merge a gateway echo into the record if no newer local change exists
    pub fn merge_echo(&mut self, echo: Task, expected_revision: u64) -> bool {
        match self.tasks.get_mut(&echo.id) {
            Some(current) if current.revision == expected_revision => {
                *current = Task {
                    revision: expected_revision,
                    ..echo
                };
                true
            }
            _ => false,
        }
    }

    /// Swap a provisional record for the gateway's canonical one.
    ///
    /// If the provisional record changed after creation, only the canonical
    /// id and creation time are taken and the local fields are kept.
    pub fn adopt(
        &mut self,
        provisional: &TaskId,
        canonical: Task,
        expected_revision: u64,
    ) -> Option<Task> {
        let local = self.tasks.remove(provisional)?;
        let adopted = if local.revision == expected_revision {
            canonical
        } else {
            Task {
                id: canonical.id,
                created_at: canonical.created_at,
                ..local
            }
        };
        self.insert(adopted.clone());
        self.tasks.get(&adopted.id).cloned()
    }

    /// Assign sort_order 0..n-1 following `ids`
    pub fn apply_order(&mut self, ids: &[TaskId]) -> OrderSnapshot {
        let mut snapshot = OrderSnapshot::default();
        for (index, id) in ids.iter().enumerate() {
            let revision = self.bump();
            if let Some(task) = self.tasks.get_mut(id) {
                let previous = task.sort_order;
                task.sort_order = Some(index as i64);
                task.revision = revision;
                snapshot.entries.push((id.clone(), previous, revision));
            }
        }
        snapshot
    }

    /// Undo [`Self::apply_order`]. Returns how many records were left alone
    /// because a newer change touched them.
    pub fn restore_order(&mut self, snapshot: &OrderSnapshot) -> usize {
        let mut skipped = 0;
        for (id, previous, revision) in &snapshot.entries {
            match self.tasks.get_mut(id) {
                Some(task) if task.revision == *revision => task.sort_order = *previous,
                _ => skipped += 1,
            }
        }
        skipped
    }

    /// Re-point every task of `from` to `to`. Each status partition of `from`
    /// is appended, in its current order, to the tail of the matching
    /// partition of `to`.
    pub fn reassign_version(&mut self, from: &VersionKey, to: &VersionKey) -> Vec<TaskSnapshot> {
        let mut snapshots = Vec::new();
        for status in Status::ALL {
            let source = PartitionKey::new(status, from.clone());
            let target = PartitionKey::new(status, to.clone());
            let mut next = self.next_sort_order(&target);

            for id in self.partition_ids(&source) {
                let revision = self.bump();
                if let Some(task) = self.tasks.get_mut(&id) {
                    let previous = task.clone();
                    task.version_id = to.clone();
                    task.sort_order = Some(next);
                    task.updated_at = Utc::now();
                    task.revision = revision;
                    next += 1;
                    snapshots.push(TaskSnapshot { previous, revision });
                }
            }
        }
        snapshots
    }

    /// Point tasks at a version's canonical key after the gateway rekeyed it
    pub fn rekey_version(&mut self, old: &VersionKey, new: &VersionKey) -> usize {
        let mut count = 0;
        for task in self.tasks.values_mut() {
            if &task.version_id == old {
                task.version_id = new.clone();
                count += 1;
            }
        }
        count
    }
}
