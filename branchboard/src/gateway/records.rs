//! Canonical record set shared by the gateway adapters.
//!
//! Each method applies one gateway operation with the rules a backend
//! enforces, and reports what it touched so a durable adapter knows which
//! files to rewrite.

use super::{GatewayError, GatewayOp, GatewayResult};
use crate::defaults::builtin_version;
use crate::store::TaskStore;
use crate::types::{NewTask, NewVersion, Task, TaskId, TaskPatch, Version, VersionKey};
use std::collections::BTreeMap;

/// Outcome of a version deletion
#[derive(Debug, Clone)]
pub(crate) struct VersionDeletion {
    pub reassigned: Vec<Task>,
    /// Written for built-ins; `None` when a custom record was removed
    pub tombstone: Option<Version>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Records {
    pub tasks: TaskStore,
    /// Stored version records. Built-ins appear only once touched.
    pub versions: BTreeMap<VersionKey, Version>,
}

impl Records {
    pub fn new(tasks: Vec<Task>, versions: Vec<Version>) -> Self {
        Self {
            tasks: TaskStore::from_tasks(tasks),
            versions: versions.into_iter().map(|v| (v.key.clone(), v)).collect(),
        }
    }

    /// The stored record, falling back to the built-in seed
    fn version(&self, key: &VersionKey) -> Option<Version> {
        self.versions
            .get(key)
            .cloned()
            .or_else(|| builtin_version(key))
    }

    fn visible_version(&self, op: GatewayOp, key: &VersionKey) -> GatewayResult<Version> {
        match self.version(key) {
            Some(v) if !v.hidden => Ok(v),
            Some(_) => Err(GatewayError::rejected(op, format!("version '{}' is deleted", key))),
            None => Err(GatewayError::not_found("version", key)),
        }
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.tasks.list()
    }

    pub fn list_versions(&self) -> Vec<Version> {
        self.versions.values().cloned().collect()
    }

    pub fn create_task(&mut self, new: &NewTask) -> GatewayResult<Task> {
        if new.title.trim().is_empty() {
            return Err(GatewayError::rejected(GatewayOp::CreateTask, "title is empty"));
        }
        self.visible_version(GatewayOp::CreateTask, &new.version_id)?;

        let task = new.clone().into_task(TaskId::new());
        self.tasks.insert(task.clone());
        Ok(task)
    }

    pub fn update_task(&mut self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        if let Some(version) = &patch.version_id {
            self.visible_version(GatewayOp::UpdateTask, version)?;
        }
        self.tasks
            .patch(id, patch)
            .ok_or_else(|| GatewayError::not_found("task", id))?;
        self.tasks
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("task", id))
    }

    pub fn delete_task(&mut self, id: &TaskId) -> GatewayResult<Task> {
        self.tasks
            .remove(id)
            .ok_or_else(|| GatewayError::not_found("task", id))
    }

    pub fn reorder_tasks(&mut self, ids: &[TaskId]) -> GatewayResult<Vec<Task>> {
        if let Some(missing) = ids.iter().find(|id| !self.tasks.contains(id)) {
            return Err(GatewayError::not_found("task", missing));
        }
        self.tasks.apply_order(ids);
        Ok(ids
            .iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect())
    }

    pub fn create_version(&mut self, new: &NewVersion) -> GatewayResult<Version> {
        if self.version(&new.key).is_some() {
            return Err(GatewayError::rejected(
                GatewayOp::CreateVersion,
                format!("version '{}' already exists", new.key),
            ));
        }
        let version = new.clone().into_version();
        self.versions.insert(version.key.clone(), version.clone());
        Ok(version)
    }

    pub fn update_version(&mut self, key: &VersionKey, label: &str) -> GatewayResult<Version> {
        if key.is_backlog() {
            return Err(GatewayError::rejected(
                GatewayOp::UpdateVersion,
                "the backlog cannot be renamed",
            ));
        }
        let mut version = self.visible_version(GatewayOp::UpdateVersion, key)?;
        version.label = label.to_string();
        self.versions.insert(key.clone(), version.clone());
        Ok(version)
    }

    pub fn delete_version(
        &mut self,
        key: &VersionKey,
        reassign_to: &VersionKey,
    ) -> GatewayResult<VersionDeletion> {
        let op = GatewayOp::DeleteVersion;
        if key.is_backlog() {
            return Err(GatewayError::rejected(op, "the backlog cannot be deleted"));
        }
        if key == reassign_to {
            return Err(GatewayError::rejected(op, "cannot reassign a version to itself"));
        }
        let version = self.visible_version(op, key)?;
        self.visible_version(op, reassign_to)?;

        let reassigned = self
            .tasks
            .reassign_version(key, reassign_to)
            .into_iter()
            .filter_map(|snapshot| self.tasks.get(&snapshot.previous.id).cloned())
            .collect();

        let tombstone = if version.is_builtin() {
            let tombstone = version.tombstone();
            self.versions.insert(key.clone(), tombstone.clone());
            Some(tombstone)
        } else {
            self.versions.remove(key);
            None
        };

        Ok(VersionDeletion {
            reassigned,
            tombstone,
        })
    }

    pub fn reorder_versions(&mut self, keys: &[VersionKey]) -> GatewayResult<Vec<Version>> {
        let mut touched = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().filter(|k| !k.is_backlog()).enumerate() {
            let mut version = self.visible_version(GatewayOp::ReorderVersions, key)?;
            version.order_index = index as i64;
            touched.push(version);
        }
        for version in &touched {
            self.versions.insert(version.key.clone(), version.clone());
        }
        Ok(touched)
    }
}
