use crate::auth::CurrentUser;
use crate::task::validation::{validate_description, validate_due_date, validate_title};
use crate::task::{
    CreateTaskArgs, Priority, Status, Task, TaskService, TaskServiceError, UpdateTaskArgs,
};
use axum::{
    Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared state for the task API routes.
#[derive(Clone)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    pub id: i32,
    /// ID of the owning user
    pub owner_id: String,
    /// Task title
    pub title: String,
    /// Task description
    pub description: String,
    /// Optional due date, milliseconds since epoch
    pub due_date: Option<i64>,
    /// Task priority
    pub priority: Priority,
    /// Task status
    pub status: Status,
    /// Creation timestamp, milliseconds since epoch
    pub created_at: i64,
    /// Last-mutation timestamp, milliseconds since epoch
    pub updated_at: i64,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            owner_id: task.owner_id().to_string(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            due_date: task.due_date(),
            priority: task.priority(),
            status: task.status(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// API response for listing tasks.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    /// List of tasks, newest first
    pub tasks: Vec<TaskJson>,
    /// Total number of tasks returned
    pub count: usize,
}

/// API response for a successfully created task.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskResponse {
    /// ID of the newly created task
    pub id: i32,
}

/// JSON response for API errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Query parameters for filtering the task listing.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TasksQuery {
    /// Optional status to filter by
    #[serde(default)]
    status: Option<String>,
    /// Optional priority to filter by
    #[serde(default)]
    priority: Option<String>,
}

/// JSON request payload for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Task title, non-empty, at most 200 characters
    pub title: String,
    /// Task description, at most 2000 characters
    pub description: String,
    /// Optional due date, milliseconds since epoch
    pub due_date: Option<i64>,
    /// Task priority
    pub priority: Priority,
    /// Task status, defaults to `todo` when omitted
    pub status: Option<Status>,
}

/// JSON request payload for partially updating a task. Omitted fields are
/// left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

/// Error type for task API operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// No valid caller identity on the request.
    #[error("Authentication required to access this resource")]
    Unauthenticated,
    /// The caller is authenticated but does not own the target task.
    #[error("You do not have access to this task")]
    Forbidden,
    /// The target task id does not resolve.
    #[error("Task not found")]
    NotFound,
    /// Validation failure on a supplied field.
    #[error("{0}")]
    InvalidInput(String),
    /// Store-level failure, propagated unchanged.
    #[error("Task service error: {0}")]
    Service(#[from] TaskServiceError),
}

impl From<crate::task::validation::ValidationError> for TaskApiError {
    fn from(err: crate::task::validation::ValidationError) -> Self {
        TaskApiError::InvalidInput(err.to_string())
    }
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let (status_code, error_code) = match &self {
            TaskApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            TaskApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            TaskApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TaskApiError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT"),
            // A task deleted between the ownership check and the write
            // surfaces as not found, not as a server error.
            TaskApiError::Service(TaskServiceError::TaskNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            TaskApiError::Service(err) => {
                tracing::error!("Task service failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let message = match &self {
            TaskApiError::Service(TaskServiceError::TaskNotFound(_)) => "Task not found".to_string(),
            TaskApiError::Service(_) => {
                "An unexpected error occurred while processing your request".to_string()
            }
            other => other.to_string(),
        };

        (
            status_code,
            Json(ErrorResponse {
                error: error_code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Resolves the caller identity set by the auth middleware.
fn require_user(current_user: Option<Extension<CurrentUser>>) -> Result<CurrentUser, TaskApiError> {
    match current_user {
        Some(Extension(user)) => Ok(user),
        None => Err(TaskApiError::Unauthenticated),
    }
}

/// Ownership guard: loads the task and verifies the caller owns it.
/// An unresolvable id is NotFound; a resolvable id owned by someone else is
/// Forbidden.
async fn load_owned_task(
    service: &TaskService<'_>,
    task_id: i32,
    user: &CurrentUser,
) -> Result<Task, TaskApiError> {
    let task = match service.get_task_by_id(task_id).await {
        Ok(task) => task,
        Err(TaskServiceError::TaskNotFound(_)) => return Err(TaskApiError::NotFound),
        Err(err) => return Err(TaskApiError::Service(err)),
    };

    if task.owner_id() != user.id {
        return Err(TaskApiError::Forbidden);
    }

    Ok(task)
}

/// Handler for GET /api/v1/tasks - Lists the caller's tasks, optionally
/// filtered by status or priority.
#[tracing::instrument(skip(state, current_user))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(
        ("status" = Option<String>, Query, description = "Filter by status: todo, in-progress, done"),
        ("priority" = Option<String>, Query, description = "Filter by priority: low, medium, high")
    ),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 422, description = "Invalid filter value", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<TaskState>>,
    current_user: Option<Extension<CurrentUser>>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<TasksResponse>, TaskApiError> {
    let user = require_user(current_user)?;
    let service = TaskService::new(&state.db);

    let tasks = match (query.status, query.priority) {
        (Some(_), Some(_)) => {
            return Err(TaskApiError::InvalidInput(
                "Cannot filter by status and priority at the same time".to_string(),
            ));
        }
        (Some(status), None) => {
            let status = Status::from_str(&status).map_err(|_| {
                TaskApiError::InvalidInput(format!("Invalid status: {}", status))
            })?;
            service.get_tasks_by_status(&user.id, status).await?
        }
        (None, Some(priority)) => {
            let priority = Priority::from_str(&priority).map_err(|_| {
                TaskApiError::InvalidInput(format!("Invalid priority: {}", priority))
            })?;
            service.get_tasks_by_priority(&user.id, priority).await?
        }
        (None, None) => service.get_tasks_by_owner(&user.id).await?,
    };

    let json_tasks: Vec<TaskJson> = tasks.into_iter().map(TaskJson::from).collect();
    let count = json_tasks.len();

    Ok(Json(TasksResponse {
        tasks: json_tasks,
        count,
    }))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task owned by the
/// caller.
#[tracing::instrument(skip(state, current_user))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Successfully retrieved task", body = TaskJson),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Task owned by another user", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(task_id): Path<i32>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let user = require_user(current_user)?;
    let service = TaskService::new(&state.db);

    let task = load_owned_task(&service, task_id, &user).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for POST /api/v1/tasks - Creates a task owned by the caller.
#[tracing::instrument(skip(state, current_user, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = CreateTaskResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 422, description = "Validation failure", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    current_user: Option<Extension<CurrentUser>>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), TaskApiError> {
    let user = require_user(current_user)?;

    validate_title(&payload.title)?;
    validate_description(&payload.description)?;
    validate_due_date(payload.due_date)?;

    let service = TaskService::new(&state.db);
    let task = service
        .create_task(CreateTaskArgs {
            owner_id: user.id,
            title: payload.title.trim().to_string(),
            description: payload.description.trim().to_string(),
            due_date: payload.due_date,
            priority: payload.priority,
            status: payload.status.unwrap_or(Status::Todo),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse { id: task.id() }),
    ))
}

/// Handler for PUT /api/v1/tasks/{id} - Partially updates a task owned by
/// the caller.
#[tracing::instrument(skip(state, current_user, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 204, description = "Task updated"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Task owned by another user", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 422, description = "Validation failure", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(task_id): Path<i32>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<StatusCode, TaskApiError> {
    let user = require_user(current_user)?;
    let service = TaskService::new(&state.db);

    load_owned_task(&service, task_id, &user).await?;

    if let Some(title) = &payload.title {
        validate_title(title)?;
    }
    if let Some(description) = &payload.description {
        validate_description(description)?;
    }
    if let Some(due_date) = payload.due_date {
        validate_due_date(Some(due_date))?;
    }

    service
        .update_task(
            task_id,
            UpdateTaskArgs {
                title: payload.title.map(|title| title.trim().to_string()),
                description: payload
                    .description
                    .map(|description| description.trim().to_string()),
                due_date: payload.due_date,
                priority: payload.priority,
                status: payload.status,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /api/v1/tasks/{id} - Permanently deletes a task owned
/// by the caller.
#[tracing::instrument(skip(state, current_user))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Task owned by another user", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(task_id): Path<i32>,
) -> Result<StatusCode, TaskApiError> {
    let user = require_user(current_user)?;
    let service = TaskService::new(&state.db);

    load_owned_task(&service, task_id, &user).await?;
    service.delete_task(task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/v1/tasks/{id}/complete - Marks a task owned by the
/// caller as done. Idempotent.
#[tracing::instrument(skip(state, current_user))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/complete",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task marked as done"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Task owned by another user", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn complete_task_handler(
    State(state): State<Arc<TaskState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(task_id): Path<i32>,
) -> Result<StatusCode, TaskApiError> {
    let user = require_user(current_user)?;
    let service = TaskService::new(&state.db);

    load_owned_task(&service, task_id, &user).await?;
    service.mark_task_complete(task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/{id}/complete", post(complete_task_handler))
        .with_state(state)
}
