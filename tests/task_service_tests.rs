use sea_orm::DatabaseConnection;
use std::time::Duration;
use taskman_server::task::{
    CreateTaskArgs, Priority, Status, TaskService, TaskServiceError, UpdateTaskArgs,
};
use testcontainers_modules::{postgres, testcontainers};

mod common;

/// Test context for service tests.
pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

/// Setup function for service tests using a PostgreSQL container.
async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    Ok(TestContext { db, container })
}

fn task_args(owner_id: &str, title: &str) -> CreateTaskArgs {
    CreateTaskArgs {
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        due_date: None,
        priority: Priority::Medium,
        status: Status::Todo,
    }
}

/// Timestamps are millisecond-granular; space out writes so ordering and
/// strict updated_at advancement are observable.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn can_create_task_with_equal_creation_and_update_timestamps() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let task = service
        .create_task(CreateTaskArgs {
            owner_id: "alice".to_string(),
            title: "Buy milk".to_string(),
            description: "2%".to_string(),
            due_date: Some(1_700_000_000_000),
            priority: Priority::Low,
            status: Status::Todo,
        })
        .await
        .unwrap();

    assert_eq!(task.owner_id(), "alice");
    assert_eq!(task.title(), "Buy milk");
    assert_eq!(task.description(), "2%");
    assert_eq!(task.due_date(), Some(1_700_000_000_000));
    assert_eq!(task.priority(), Priority::Low);
    assert_eq!(task.status(), Status::Todo);
    assert_eq!(task.created_at(), task.updated_at());
}

#[tokio::test]
async fn can_get_task_by_id() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let created = service.create_task(task_args("alice", "Water plants")).await.unwrap();
    let fetched = service.get_task_by_id(created.id()).await.unwrap();

    assert_eq!(fetched, created);
}

#[tokio::test]
async fn can_report_missing_task_as_not_found() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let result = service.get_task_by_id(9999).await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(9999))));
}

#[tokio::test]
async fn can_list_owner_tasks_newest_first() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let first = service.create_task(task_args("alice", "First")).await.unwrap();
    tick().await;
    let second = service.create_task(task_args("alice", "Second")).await.unwrap();
    tick().await;
    let third = service.create_task(task_args("alice", "Third")).await.unwrap();
    service.create_task(task_args("bob", "Not alice's")).await.unwrap();

    let tasks = service.get_tasks_by_owner("alice").await.unwrap();

    let ids: Vec<i32> = tasks.iter().map(|task| task.id()).collect();
    assert_eq!(ids, vec![third.id(), second.id(), first.id()]);
}

#[tokio::test]
async fn can_filter_tasks_by_status() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let todo = service.create_task(task_args("alice", "Pending")).await.unwrap();
    let mut done_args = task_args("alice", "Finished");
    done_args.status = Status::Done;
    service.create_task(done_args).await.unwrap();
    service.create_task(task_args("bob", "Someone else's")).await.unwrap();

    let tasks = service.get_tasks_by_status("alice", Status::Todo).await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id(), todo.id());
}

#[tokio::test]
async fn can_filter_tasks_by_priority() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let mut high_args = task_args("alice", "Urgent");
    high_args.priority = Priority::High;
    let high = service.create_task(high_args).await.unwrap();
    service.create_task(task_args("alice", "Routine")).await.unwrap();

    let tasks = service
        .get_tasks_by_priority("alice", Priority::High)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id(), high.id());

    let low_tasks = service
        .get_tasks_by_priority("alice", Priority::Low)
        .await
        .unwrap();
    assert!(low_tasks.is_empty());
}

#[tokio::test]
async fn can_update_only_supplied_fields() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let created = service
        .create_task(CreateTaskArgs {
            owner_id: "alice".to_string(),
            title: "Old title".to_string(),
            description: "Keep me".to_string(),
            due_date: Some(42),
            priority: Priority::Medium,
            status: Status::Todo,
        })
        .await
        .unwrap();
    tick().await;

    let updated = service
        .update_task(
            created.id(),
            UpdateTaskArgs {
                title: Some("New title".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title(), "New title");
    assert_eq!(updated.description(), "Keep me");
    assert_eq!(updated.due_date(), Some(42));
    assert_eq!(updated.priority(), Priority::Medium);
    assert_eq!(updated.status(), Status::Todo);
    assert_eq!(updated.created_at(), created.created_at());
    assert!(updated.updated_at() > created.updated_at());
}

#[tokio::test]
async fn can_report_update_of_missing_task_as_not_found() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let result = service
        .update_task(
            12345,
            UpdateTaskArgs {
                title: Some("Ghost".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(12345))));
}

#[tokio::test]
async fn can_delete_task_permanently() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let created = service.create_task(task_args("alice", "Ephemeral")).await.unwrap();

    let deleted = service.delete_task(created.id()).await.unwrap();
    assert_eq!(deleted.id(), created.id());

    let result = service.get_task_by_id(created.id()).await;
    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(_))));
}

#[tokio::test]
async fn can_mark_task_complete_idempotently() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TaskService::new(&ctx.db);

    let created = service.create_task(task_args("alice", "Finish report")).await.unwrap();
    tick().await;

    let first = service.mark_task_complete(created.id()).await.unwrap();
    assert_eq!(first.status(), Status::Done);
    assert!(first.updated_at() > created.updated_at());
    tick().await;

    let second = service.mark_task_complete(created.id()).await.unwrap();
    assert_eq!(second.status(), Status::Done);
    assert!(second.updated_at() > first.updated_at());
}
