//! FileGateway - YAML records on disk
//!
//! Layout under the data directory:
//!
//! ```text
//! <root>/
//!   tasks/<id>.yaml
//!   versions/<key>.yaml
//!   .lock
//! ```
//!
//! Every mutation takes an exclusive lock on `.lock`, loads the records,
//! applies the operation and rewrites only the files it touched. Mutations
//! wait for the lock: within one process they queue on a mutex, across
//! processes on the lock file.

use super::records::Records;
use super::{GatewayError, GatewayResult, SyncGateway};
use crate::types::{NewTask, NewVersion, Task, TaskId, TaskPatch, Version, VersionKey};
use async_trait::async_trait;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};

const RECORD_EXTENSION: &str = "yaml";

/// Gateway backed by a directory of YAML files
#[derive(Debug, Clone)]
pub struct FileGateway {
    root: PathBuf,
    /// Held for the whole of a mutation; clones share it
    writer: Arc<Mutex<()>>,
}

impl FileGateway {
    /// Create a gateway for the given data directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn task_path(&self, id: &TaskId) -> PathBuf {
        self.tasks_dir()
            .join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_path(&self, key: &VersionKey) -> PathBuf {
        self.versions_dir()
            .join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    pub fn directories_exist(&self) -> bool {
        self.root.exists() && self.tasks_dir().exists() && self.versions_dir().exists()
    }

    /// Create the directory structure. Idempotent.
    pub async fn ensure_directories(&self) -> GatewayResult<()> {
        if !self.directories_exist() {
            fs::create_dir_all(self.tasks_dir()).await?;
            fs::create_dir_all(self.versions_dir()).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Record I/O
    // =========================================================================

    pub async fn read_task(&self, id: &TaskId) -> GatewayResult<Task> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(GatewayError::not_found("task", id));
        }
        read_record(&path).await
    }

    pub async fn write_task(&self, task: &Task) -> GatewayResult<()> {
        write_record(&self.task_path(&task.id), task).await
    }

    pub async fn delete_task_file(&self, id: &TaskId) -> GatewayResult<()> {
        remove_if_exists(&self.task_path(id)).await
    }

    pub async fn read_all_tasks(&self) -> GatewayResult<Vec<Task>> {
        read_all(&self.tasks_dir()).await
    }

    pub async fn write_version(&self, version: &Version) -> GatewayResult<()> {
        write_record(&self.version_path(&version.key), version).await
    }

    pub async fn delete_version_file(&self, key: &VersionKey) -> GatewayResult<()> {
        remove_if_exists(&self.version_path(key)).await
    }

    pub async fn read_all_versions(&self) -> GatewayResult<Vec<Version>> {
        read_all(&self.versions_dir()).await
    }

    async fn load(&self) -> GatewayResult<Records> {
        Ok(Records::new(
            self.read_all_tasks().await?,
            self.read_all_versions().await?,
        ))
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Acquire the exclusive data-directory lock, waiting until it is free
    pub async fn lock(&self) -> GatewayResult<DataLock> {
        let writer = self.writer.clone().lock_owned().await;
        fs::create_dir_all(&self.root).await?;

        let lock_path = self.lock_path();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| GatewayError::Lock {
            message: format!("lock task failed: {}", e),
        })?
        .map_err(|e| GatewayError::Lock {
            message: e.to_string(),
        })?;

        Ok(DataLock {
            file,
            _writer: writer,
        })
    }
}

/// RAII lock guard - releases on drop
#[derive(Debug)]
pub struct DataLock {
    file: std::fs::File,
    _writer: OwnedMutexGuard<()>,
}

impl Drop for DataLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!(error = %e, "failed to release data lock");
        }
    }
}

#[async_trait]
impl SyncGateway for FileGateway {
    async fn list_tasks(&self) -> GatewayResult<Vec<Task>> {
        Ok(self.load().await?.list_tasks())
    }

    async fn create_task(&self, task: &NewTask) -> GatewayResult<Task> {
        let _lock = self.lock().await?;
        let created = self.load().await?.create_task(task)?;
        self.write_task(&created).await?;
        Ok(created)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        let _lock = self.lock().await?;
        let updated = self.load().await?.update_task(id, patch)?;
        self.write_task(&updated).await?;
        Ok(updated)
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        let _lock = self.lock().await?;
        self.load().await?.delete_task(id)?;
        self.delete_task_file(id).await
    }

    async fn reorder_tasks(&self, ids: &[TaskId]) -> GatewayResult<()> {
        let _lock = self.lock().await?;
        let touched = self.load().await?.reorder_tasks(ids)?;
        for task in &touched {
            self.write_task(task).await?;
        }
        Ok(())
    }

    async fn list_versions(&self) -> GatewayResult<Vec<Version>> {
        self.read_all_versions().await
    }

    async fn create_version(&self, version: &NewVersion) -> GatewayResult<Version> {
        let _lock = self.lock().await?;
        let created = self.load().await?.create_version(version)?;
        self.write_version(&created).await?;
        Ok(created)
    }

    async fn update_version(&self, key: &VersionKey, label: &str) -> GatewayResult<Version> {
        let _lock = self.lock().await?;
        let updated = self.load().await?.update_version(key, label)?;
        self.write_version(&updated).await?;
        Ok(updated)
    }

    async fn delete_version(
        &self,
        key: &VersionKey,
        reassign_to: &VersionKey,
    ) -> GatewayResult<()> {
        let _lock = self.lock().await?;
        let deletion = self.load().await?.delete_version(key, reassign_to)?;

        for task in &deletion.reassigned {
            self.write_task(task).await?;
        }
        match &deletion.tombstone {
            Some(tombstone) => self.write_version(tombstone).await,
            None => self.delete_version_file(key).await,
        }
    }

    async fn reorder_versions(&self, keys: &[VersionKey]) -> GatewayResult<()> {
        let _lock = self.lock().await?;
        let touched = self.load().await?.reorder_versions(keys)?;
        for version in &touched {
            self.write_version(version).await?;
        }
        Ok(())
    }
}

async fn read_record<T: DeserializeOwned>(path: &Path) -> GatewayResult<T> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_yaml_ng::from_str(&content)?)
}

async fn write_record<T: Serialize>(path: &Path, record: &T) -> GatewayResult<()> {
    let content = serde_yaml_ng::to_string(record)?;
    atomic_write(path, content.as_bytes()).await
}

async fn remove_if_exists(path: &Path) -> GatewayResult<()> {
    if path.exists() {
        fs::remove_file(path).await?;
    }
    Ok(())
}

/// Read every `*.yaml` record in a directory
async fn read_all<T: DeserializeOwned>(dir: &Path) -> GatewayResult<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some(RECORD_EXTENSION) {
            records.push(read_record(&path).await?);
        }
    }
    Ok(records)
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> GatewayResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BoardContext;
    use crate::notify::RecordingNotifier;
    use crate::operation::Execute;
    use crate::task::{AddTask, UpdateTask};
    use crate::types::{Priority, Status};
    use std::time::Duration;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, FileGateway) {
        let temp = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp.path().join("data"));
        gateway.ensure_directories().await.unwrap();
        (temp, gateway)
    }

    fn new_task(title: &str, version: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: Status::Todo,
            version_id: version.into(),
            priority: Priority::Medium,
            sort_order: 0,
        }
    }

    #[tokio::test]
    async fn test_paths() {
        let (temp, gateway) = setup().await;
        let root = temp.path().join("data");
        assert_eq!(gateway.root(), root);
        assert_eq!(
            gateway.version_path(&"v1".into()),
            root.join("versions").join("v1.yaml")
        );
        assert!(gateway.directories_exist());
    }

    #[tokio::test]
    async fn test_task_roundtrip_on_disk() {
        let (_temp, gateway) = setup().await;
        let created = gateway.create_task(&new_task("Ship it", "v1")).await.unwrap();
        assert!(gateway.task_path(&created.id).exists());

        let loaded = gateway.read_task(&created.id).await.unwrap();
        assert_eq!(loaded.title, "Ship it");
        assert_eq!(loaded.priority, Priority::Medium);

        gateway
            .update_task(&created.id, &TaskPatch::new().with_status(Status::Done))
            .await
            .unwrap();
        assert_eq!(
            gateway.read_task(&created.id).await.unwrap().status,
            Status::Done
        );

        gateway.delete_task(&created.id).await.unwrap();
        assert!(gateway.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tombstone_survives_reload() {
        let (_temp, gateway) = setup().await;
        gateway.create_task(&new_task("a", "v1")).await.unwrap();
        gateway
            .delete_version(&"v1".into(), &VersionKey::backlog())
            .await
            .unwrap();

        let reopened = FileGateway::new(gateway.root());
        let versions = reopened.list_versions().await.unwrap();
        assert_eq!(versions.len(), 1);
        assert!(versions[0].hidden);

        let tasks = reopened.list_tasks().await.unwrap();
        assert!(tasks[0].version_id.is_backlog());
    }

    #[tokio::test]
    async fn test_lock_waits_in_process() {
        let (_temp, gateway) = setup().await;
        let held = gateway.lock().await.unwrap();

        let clone = gateway.clone();
        let waiting = tokio::spawn(async move { clone.create_task(&new_task("queued", "v1")).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(held);
        let created = waiting.await.unwrap().unwrap();
        assert!(gateway.task_path(&created.id).exists());
    }

    #[tokio::test]
    async fn test_lock_file_waits_across_handles() {
        let (_temp, gateway) = setup().await;
        let other = FileGateway::new(gateway.root());
        let held = gateway.lock().await.unwrap();

        let waiting = tokio::spawn(async move { other.lock().await.map(drop) });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(held);
        waiting.await.unwrap().unwrap();
        let _again = gateway.lock().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_updates_all_land() {
        let (_temp, gateway) = setup().await;
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = Arc::new(
            BoardContext::new(gateway.clone()).with_notifier(notifier.clone()),
        );

        let mut ids = Vec::new();
        for i in 0..8 {
            let task = AddTask::quick(format!("Task {}", i), Status::Todo, "v1")
                .execute(ctx.as_ref())
                .await
                .unwrap();
            ids.push(task.id);
        }

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    UpdateTask::new(id)
                        .with_title(format!("Edited {}", i))
                        .execute(ctx.as_ref())
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(notifier.received().is_empty());
        for (i, id) in ids.iter().enumerate() {
            let stored = gateway.read_task(id).await.unwrap();
            assert_eq!(stored.title, format!("Edited {}", i));
            assert_eq!(stored.sort_order, Some(i as i64));
        }
    }
}
