//! MemoryGateway - in-process canonical store

use super::records::Records;
use super::{GatewayError, GatewayOp, GatewayResult, SyncGateway};
use crate::types::{NewTask, NewVersion, Task, TaskId, TaskPatch, Version, VersionKey};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    records: Records,
    calls: Vec<GatewayOp>,
    failing: HashSet<GatewayOp>,
    failing_once: HashSet<GatewayOp>,
}

/// Gateway that keeps everything in memory.
///
/// Every call is recorded before it runs. Operations marked with
/// [`MemoryGateway::fail`] are rejected without touching the records.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing task records
    pub fn with_tasks(self, tasks: impl IntoIterator<Item = Task>) -> Self {
        {
            let mut state = self.lock();
            for task in tasks {
                state.records.tasks.insert(task);
            }
        }
        self
    }

    /// Start with existing version records
    pub fn with_versions(self, versions: impl IntoIterator<Item = Version>) -> Self {
        {
            let mut state = self.lock();
            for version in versions {
                state.records.versions.insert(version.key.clone(), version);
            }
        }
        self
    }

    /// Reject every future call of `op`
    pub fn fail(&self, op: GatewayOp) {
        self.lock().failing.insert(op);
    }

    /// Reject only the next call of `op`
    pub fn fail_once(&self, op: GatewayOp) {
        self.lock().failing_once.insert(op);
    }

    /// Stop rejecting `op`
    pub fn recover(&self, op: GatewayOp) {
        let mut state = self.lock();
        state.failing.remove(&op);
        state.failing_once.remove(&op);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<GatewayOp> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, op: GatewayOp) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    /// Number of write calls made so far
    pub fn mutation_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_mutation()).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Canonical tasks as the gateway holds them
    pub fn stored_tasks(&self) -> Vec<Task> {
        self.lock().records.list_tasks()
    }

    pub fn stored_task(&self, id: &TaskId) -> Option<Task> {
        self.lock().records.tasks.get(id).cloned()
    }

    /// Canonical version records, tombstones included
    pub fn stored_versions(&self) -> Vec<Version> {
        self.lock().records.list_versions()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and apply any injected failure
    fn begin(&self, op: GatewayOp) -> GatewayResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(op);
        if state.failing_once.remove(&op) || state.failing.contains(&op) {
            tracing::debug!(op = %op, "injected gateway failure");
            return Err(GatewayError::rejected(op, "injected failure"));
        }
        Ok(state)
    }
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn list_tasks(&self) -> GatewayResult<Vec<Task>> {
        Ok(self.begin(GatewayOp::ListTasks)?.records.list_tasks())
    }

    async fn create_task(&self, task: &NewTask) -> GatewayResult<Task> {
        self.begin(GatewayOp::CreateTask)?.records.create_task(task)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        self.begin(GatewayOp::UpdateTask)?
            .records
            .update_task(id, patch)
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        self.begin(GatewayOp::DeleteTask)?.records.delete_task(id)?;
        Ok(())
    }

    async fn reorder_tasks(&self, ids: &[TaskId]) -> GatewayResult<()> {
        self.begin(GatewayOp::ReorderTasks)?
            .records
            .reorder_tasks(ids)?;
        Ok(())
    }

    async fn list_versions(&self) -> GatewayResult<Vec<Version>> {
        Ok(self.begin(GatewayOp::ListVersions)?.records.list_versions())
    }

    async fn create_version(&self, version: &NewVersion) -> GatewayResult<Version> {
        self.begin(GatewayOp::CreateVersion)?
            .records
            .create_version(version)
    }

    async fn update_version(&self, key: &VersionKey, label: &str) -> GatewayResult<Version> {
        self.begin(GatewayOp::UpdateVersion)?
            .records
            .update_version(key, label)
    }

    async fn delete_version(
        &self,
        key: &VersionKey,
        reassign_to: &VersionKey,
    ) -> GatewayResult<()> {
        self.begin(GatewayOp::DeleteVersion)?
            .records
            .delete_version(key, reassign_to)?;
        Ok(())
    }

    async fn reorder_versions(&self, keys: &[VersionKey]) -> GatewayResult<()> {
        self.begin(GatewayOp::ReorderVersions)?
            .records
            .reorder_versions(keys)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, Status};

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: Status::Todo,
            version_id: VersionKey::backlog(),
            priority: Priority::Low,
            sort_order: 0,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_canonical_id() {
        let gateway = MemoryGateway::new();
        let task = gateway.create_task(&new_task("Write docs")).await.unwrap();
        assert!(!task.id.is_provisional());
        assert_eq!(gateway.stored_tasks().len(), 1);
        assert_eq!(gateway.calls(), vec![GatewayOp::CreateTask]);
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_records_untouched() {
        let gateway = MemoryGateway::new();
        gateway.fail(GatewayOp::CreateTask);

        let result = gateway.create_task(&new_task("Nope")).await;
        assert!(matches!(result, Err(GatewayError::Rejected { .. })));
        assert!(gateway.stored_tasks().is_empty());
        assert_eq!(gateway.call_count(GatewayOp::CreateTask), 1);

        gateway.recover(GatewayOp::CreateTask);
        assert!(gateway.create_task(&new_task("Yes")).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_once() {
        let gateway = MemoryGateway::new();
        gateway.fail_once(GatewayOp::ListVersions);
        assert!(gateway.list_versions().await.is_err());
        assert!(gateway.list_versions().await.is_ok());
    }

    #[tokio::test]
    async fn test_mutation_count_ignores_reads() {
        let gateway = MemoryGateway::new();
        gateway.list_tasks().await.unwrap();
        gateway.list_versions().await.unwrap();
        assert_eq!(gateway.mutation_count(), 0);
        gateway.reorder_versions(&["v2".into(), "v1".into()]).await.unwrap();
        assert_eq!(gateway.mutation_count(), 1);
    }
}
