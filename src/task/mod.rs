use crate::entities::task;
use sea_orm::*;

pub mod api;
pub mod validation;

pub use task::{Priority, Status};

/// A task owned by a single user.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Task {
    id: i32,
    owner_id: String,
    title: String,
    description: String,
    due_date: Option<i64>,
    priority: Priority,
    status: Status,
    created_at: i64,
    updated_at: i64,
}

impl Task {
    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the ID of the owning user.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the due date in milliseconds since epoch, if any.
    pub fn due_date(&self) -> Option<i64> {
        self.due_date
    }

    /// Returns the priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the creation timestamp in milliseconds since epoch.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Returns the last-mutation timestamp in milliseconds since epoch.
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            due_date: model.due_date,
            priority: model.priority,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Arguments for creating a task. All fields are persisted as given; the
/// caller is responsible for validation and trimming.
#[derive(Debug, Clone)]
pub struct CreateTaskArgs {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<i64>,
    pub priority: Priority,
    pub status: Status,
}

/// Partial update: only `Some` fields are written. `updated_at` is always
/// refreshed.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

/// Data-access layer for the tasks table. Performs no authorization or
/// input validation; callers are expected to have done both.
pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl TaskService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskService {
        TaskService { db }
    }

    /// Creates a new task in the database.
    ///
    /// `created_at` and `updated_at` are both set to the current time.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, args: CreateTaskArgs) -> Result<Task, TaskServiceError> {
        let now = now_millis();
        let active_model = task::ActiveModel {
            owner_id: ActiveValue::Set(args.owner_id),
            title: ActiveValue::Set(args.title),
            description: ActiveValue::Set(args.description),
            due_date: ActiveValue::Set(args.due_date),
            priority: ActiveValue::Set(args.priority),
            status: ActiveValue::Set(args.status),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Retrieves a task by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Task` if it exists, or
    /// `TaskServiceError::TaskNotFound` otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_model = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        Ok(Task::from(task_model))
    }

    /// Retrieves all tasks for an owner, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_tasks_by_owner(&self, owner_id: &str) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .filter(task::Column::OwnerId.eq(owner_id))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves an owner's tasks with the given status, newest first.
    ///
    /// Answered by the (owner_id, status) index.
    #[tracing::instrument(skip(self))]
    pub async fn get_tasks_by_status(
        &self,
        owner_id: &str,
        status: Status,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .filter(task::Column::OwnerId.eq(owner_id))
            .filter(task::Column::Status.eq(status))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves an owner's tasks with the given priority, newest first.
    ///
    /// Answered by the (owner_id, priority) index.
    #[tracing::instrument(skip(self))]
    pub async fn get_tasks_by_priority(
        &self,
        owner_id: &str,
        priority: Priority,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .filter(task::Column::OwnerId.eq(owner_id))
            .filter(task::Column::Priority.eq(priority))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Applies a partial update to a task by its ID.
    ///
    /// Only the supplied fields are written; `updated_at` is refreshed on
    /// every successful call.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        id: i32,
        updates: UpdateTaskArgs,
    ) -> Result<Task, TaskServiceError> {
        let task_to_update = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = updates.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = updates.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(due_date) = updates.due_date {
            active_model.due_date = ActiveValue::Set(Some(due_date));
        }
        if let Some(priority) = updates.priority {
            active_model.priority = ActiveValue::Set(priority);
        }
        if let Some(status) = updates.status {
            active_model.status = ActiveValue::Set(status);
        }
        active_model.updated_at = ActiveValue::Set(now_millis());
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Permanently deletes a task by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Task` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_to_delete = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let task_copy = Task::from(task_to_delete.clone());
        task::Entity::delete_by_id(id).exec(self.db).await?;
        Ok(task_copy)
    }

    /// Marks a task as done. Idempotent: an already-done task stays done,
    /// with `updated_at` refreshed.
    #[tracing::instrument(skip(self))]
    pub async fn mark_task_complete(&self, id: i32) -> Result<Task, TaskServiceError> {
        self.update_task(
            id,
            UpdateTaskArgs {
                status: Some(Status::Done),
                ..Default::default()
            },
        )
        .await
    }
}
