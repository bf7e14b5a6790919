//! Task endpoints
//!
//! Every route requires `Authorization: Bearer <token>`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use tb_core::gateway::{BackendGateway, DeleteTaskRequest, DeletedTask, NewTaskRequest};
use tb_core::task::{Task, TaskPatch};
use tb_core::view::{ListQuery, SortMode};

use super::response::{auth_error, ok, route_error, task_error, ApiResult, RouteError};
use crate::auth::{extract_bearer_token, Claims};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    sort: Option<String>,
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Claims, RouteError> {
    let token = extract_bearer_token(headers).map_err(auth_error)?;
    let claims = state.tokens().verify(token).await.map_err(auth_error)?;
    let user_id = claims.user_id().map_err(auth_error)?;
    if state.auth_store().get_user(user_id).await.is_none() {
        return Err(route_error(StatusCode::UNAUTHORIZED, "User not found"));
    }
    Ok(claims)
}

/// GET /tasks?search=&sort=
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Task>> {
    authorize(&state, &headers).await?;

    let sort = match params.sort.as_deref() {
        Some(raw) => raw.parse::<SortMode>().map_err(task_error)?,
        None => SortMode::Default,
    };
    let mut query = ListQuery::new().with_sort(sort);
    if let Some(search) = params.search {
        query = query.with_search(search);
    }

    let tasks = state
        .task_store()
        .list_tasks(&query)
        .await
        .map_err(task_error)?;
    ok("Tasks fetched successfully", tasks)
}

/// GET /board/get-task-by-id/{id}
async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Task> {
    authorize(&state, &headers).await?;
    let task = state.task_store().get_task(&id).await.map_err(task_error)?;
    ok("Task fetched successfully", task)
}

/// POST /board/add-task
async fn add_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewTaskRequest>,
) -> ApiResult<Task> {
    let claims = authorize(&state, &headers).await?;
    let task = state
        .task_store()
        .create_task(&req.title, &req.description)
        .await
        .map_err(task_error)?;
    debug!("{} created task {}", claims.email, task.id);
    ok("Task created successfully", task)
}

/// POST /board/update-task
async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Task> {
    authorize(&state, &headers).await?;
    let task = state
        .task_store()
        .update_task(patch)
        .await
        .map_err(task_error)?;
    ok("Task updated successfully", task)
}

/// POST /board/delete-task
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DeleteTaskRequest>,
) -> ApiResult<DeletedTask> {
    let claims = authorize(&state, &headers).await?;
    let task_id = state
        .task_store()
        .delete_task(&req.task_id)
        .await
        .map_err(task_error)?;
    debug!("{} deleted task {}", claims.email, task_id);
    ok("Task deleted successfully", DeletedTask { task_id })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/board/get-task-by-id/{id}", get(get_task))
        .route("/board/add-task", post(add_task))
        .route("/board/update-task", post(update_task))
        .route("/board/delete-task", post(delete_task))
}
