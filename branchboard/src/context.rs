//! BoardContext - shared state for every command
//!
//! The context holds the in-memory Task Store and Version Registry plus the
//! gateway and notifier handles. It provides access, not logic: commands do
//! all the work.
//!
//! Store access goes through closures so a lock guard can never live across
//! an await on the gateway.

use crate::gateway::SyncGateway;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::registry::VersionRegistry;
use crate::store::TaskStore;
use crate::types::{Task, TaskId, Version};
use std::sync::{Arc, RwLock};

/// Context passed to every command
pub struct BoardContext {
    tasks: RwLock<TaskStore>,
    versions: RwLock<VersionRegistry>,
    gateway: Arc<dyn SyncGateway>,
    notifier: Arc<dyn Notifier>,
}

impl BoardContext {
    /// Create a context over a gateway, with a seeded registry and no tasks
    pub fn new(gateway: impl SyncGateway + 'static) -> Self {
        Self::from_shared(Arc::new(gateway))
    }

    /// Create a context over a gateway handle the caller keeps a clone of
    pub fn from_shared(gateway: Arc<dyn SyncGateway>) -> Self {
        Self {
            tasks: RwLock::new(TaskStore::new()),
            versions: RwLock::new(VersionRegistry::seeded()),
            gateway,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replace the notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn gateway(&self) -> &dyn SyncGateway {
        self.gateway.as_ref()
    }

    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    // =========================================================================
    // Store access
    // =========================================================================

    pub fn read_tasks<R>(&self, f: impl FnOnce(&TaskStore) -> R) -> R {
        let guard = self
            .tasks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    pub fn write_tasks<R>(&self, f: impl FnOnce(&mut TaskStore) -> R) -> R {
        let mut guard = self
            .tasks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn read_versions<R>(&self, f: impl FnOnce(&VersionRegistry) -> R) -> R {
        let guard = self
            .versions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    pub fn write_versions<R>(&self, f: impl FnOnce(&mut VersionRegistry) -> R) -> R {
        let mut guard = self
            .versions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Mutate both stores as one step. Locks versions, then tasks.
    pub fn write_both<R>(&self, f: impl FnOnce(&mut VersionRegistry, &mut TaskStore) -> R) -> R {
        let mut versions = self
            .versions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut tasks = self
            .tasks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut versions, &mut tasks)
    }

    /// Read both stores at once. Locks versions, then tasks.
    pub fn read_both<R>(&self, f: impl FnOnce(&VersionRegistry, &TaskStore) -> R) -> R {
        let versions = self
            .versions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tasks = self
            .tasks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&versions, &tasks)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.read_tasks(|store| store.get(id).cloned())
    }

    /// All tasks, grouped by version then status, each partition in order
    pub fn tasks(&self) -> Vec<Task> {
        self.read_tasks(|store| store.list())
    }

    /// Visible versions in canonical order, backlog last
    pub fn versions(&self) -> Vec<Version> {
        self.read_versions(|registry| registry.list())
    }

    /// Swap in freshly loaded state
    pub(crate) fn replace(&self, registry: VersionRegistry, store: TaskStore) {
        self.write_both(|versions, tasks| {
            *versions = registry;
            *tasks = store;
        });
    }
}
