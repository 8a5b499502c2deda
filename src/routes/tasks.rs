//! Task routes
//!
//! CRUD endpoints over the in-memory task manager.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::{
    AbsoluteUrl, Created, ItemEnvelope, LimitOffsetPagination, LimitOffsetParams, Ordering,
    OrderingParams, PageNumberPagination, PageParams, PaginatedEnvelope, SearchParams, Searching,
};
use crate::app::AppState;
use crate::domain::{CreateTask, Task, TaskStatus, UpdateTask};
use crate::error::ApiResult;
use crate::persistence::{FieldMap, Manager, Model, ModelSchema};
use crate::shortcuts::get_object_or_404;

/// Searched and ordered tasks, before pagination.
fn filtered_tasks(
    state: &AppState,
    search: &SearchParams,
    ordering: &OrderingParams,
) -> ApiResult<Vec<Task>> {
    let tasks = Searching::for_model::<Task>().apply(state.tasks.all()?, search)?;
    Ordering::for_model::<Task>()
        .with_field("created_at")
        .apply(tasks, ordering)
}

/// GET /api/tasks
///
/// List tasks, paginated by page number. Supports `?search=` over the
/// task fields and `?ordering=` (e.g. `-priority,title`).
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    AbsoluteUrl(url): AbsoluteUrl,
    Query(params): Query<PageParams>,
    Query(search): Query<SearchParams>,
    Query(ordering): Query<OrderingParams>,
) -> ApiResult<PaginatedEnvelope<Task>> {
    let tasks = filtered_tasks(&state, &search, &ordering)?;
    PageNumberPagination::from_settings(&state.settings).paginate(tasks, &url, &params)
}

/// GET /api/tasks/items
///
/// List tasks by limit and offset, with the same search and ordering.
pub async fn list_task_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitOffsetParams>,
    Query(search): Query<SearchParams>,
    Query(ordering): Query<OrderingParams>,
) -> ApiResult<ItemEnvelope<Task>> {
    let tasks = filtered_tasks(&state, &search, &ordering)?;
    LimitOffsetPagination::from_settings(&state.settings).paginate(tasks, &params)
}

/// POST /api/tasks
///
/// Create a task. New tasks always start as `todo`.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTask>,
) -> ApiResult<Created<Task>> {
    let mut overrides = FieldMap::new();
    overrides.insert("status".to_string(), json!(TaskStatus::Todo));

    let task = body.perform_create(&state.tasks, overrides)?;

    tracing::info!(task_id = ?task.pk(), title = %task.title, "Task created");

    Ok(Created(task))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    Ok(Json(get_object_or_404(&state.tasks, task_id)?))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
    Json(body): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = get_object_or_404(&state.tasks, task_id)?;
    let task = body.perform_update(&state.tasks, task, FieldMap::new())?;

    tracing::info!(task_id, "Task updated");

    Ok(Json(task))
}

/// PATCH /api/tasks/:id
pub async fn patch_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
    Json(body): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = get_object_or_404(&state.tasks, task_id)?;
    let task = body.perform_patch(&state.tasks, task, FieldMap::new())?;

    tracing::info!(task_id, "Task patched");

    Ok(Json(task))
}
