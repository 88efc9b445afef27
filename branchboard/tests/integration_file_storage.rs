//! Persistence through the file-backed gateway

use branchboard::{
    board::LoadBoard,
    task::{AddTask, ReorderTask},
    version::{CreateVersion, DeleteVersion, ListVersions, RenameVersion},
    BoardContext, Execute, FileGateway, PartitionKey, Status,
};
use tempfile::TempDir;

fn context(temp: &TempDir) -> BoardContext {
    BoardContext::new(FileGateway::new(temp.path().join("data")))
}

#[tokio::test]
async fn test_deleted_builtin_stays_hidden_after_reload() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    LoadBoard::new().execute(&ctx).await.unwrap();
    AddTask::quick("Orphan", Status::Todo, "v2")
        .execute(&ctx)
        .await
        .unwrap();

    DeleteVersion::to_backlog("v2").execute(&ctx).await.unwrap();

    let fresh = context(&temp);
    let summary = LoadBoard::new().execute(&fresh).await.unwrap();
    assert!(!summary.degraded);

    let keys: Vec<String> = fresh.versions().iter().map(|v| v.key.to_string()).collect();
    assert_eq!(keys, vec!["v1", "backlog"]);

    let hidden = ListVersions::new().with_hidden(true).execute(&fresh).await.unwrap();
    assert!(hidden.iter().any(|v| v.key.as_str() == "v2" && v.hidden));

    let tasks = fresh.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].version_id.as_str(), "backlog");
}

#[tokio::test]
async fn test_board_survives_reload() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    LoadBoard::new().execute(&ctx).await.unwrap();

    let sprint = CreateVersion::new("Sprint 7").execute(&ctx).await.unwrap();
    RenameVersion::new(sprint.key.clone(), "Sprint Seven")
        .execute(&ctx)
        .await
        .unwrap();
    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        ids.push(
            AddTask::quick(title, Status::InProgress, sprint.key.clone())
                .execute(&ctx)
                .await
                .unwrap()
                .id,
        );
    }
    ReorderTask::new(ids[2].clone(), Status::InProgress, sprint.key.clone())
        .with_before(ids[0].clone())
        .execute(&ctx)
        .await
        .unwrap();

    let fresh = context(&temp);
    let summary = LoadBoard::new().execute(&fresh).await.unwrap();
    assert_eq!(summary.tasks, 3);
    assert_eq!(summary.versions, 4);

    let labels: Vec<String> = fresh.versions().iter().map(|v| v.label.clone()).collect();
    assert_eq!(labels[2], "Sprint Seven");

    let key = PartitionKey::new(Status::InProgress, sprint.key);
    let titles: Vec<String> =
        fresh.read_tasks(|store| store.partition(&key).iter().map(|t| t.title.clone()).collect());
    assert_eq!(titles, vec!["C", "A", "B"]);
}
