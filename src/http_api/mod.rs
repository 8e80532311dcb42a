use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::calculations::cascade::{CascadeDecision, CascadePlan};
use crate::persistence::{PersistenceError, TaskStore};
use crate::project::{NewProject, Project, ProjectId, ProjectPatch, ProjectStats};
use crate::schedule::ScheduleOutcome;
use crate::task::{NewTask, Task, TaskId, TaskPatch};
use crate::timeline::drag::DragKind;
use crate::timeline::editor::{EditOutcome, EditorError, TimelineEditor};
use crate::timeline::{TimelineConfig, TimelineError, TimelineGeometry, TimelineView};
use crate::views::{self, MonthGrid};

pub type SharedStore = Arc<RwLock<Box<dyn TaskStore + Send + Sync>>>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
    timeline: TimelineConfig,
}

impl AppState {
    pub fn new<S>(store: S, timeline: TimelineConfig) -> Self
    where
        S: TaskStore + Send + Sync + 'static,
    {
        let store: Box<dyn TaskStore + Send + Sync> = Box::new(store);
        Self {
            store: Arc::new(RwLock::new(store)),
            timeline,
        }
    }

    fn store(&self) -> SharedStore {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::ProjectNotFound(_) | PersistenceError::TaskNotFound { .. } => {
                ApiError::NotFound(value.to_string())
            }
            PersistenceError::InvalidData(_) => ApiError::Invalid(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TimelineError> for ApiError {
    fn from(value: TimelineError) -> Self {
        match value {
            TimelineError::TaskNotFound(_) => ApiError::NotFound(value.to_string()),
            TimelineError::NoProjectStart | TimelineError::TaskNotScheduled(_) => {
                ApiError::Conflict(value.to_string())
            }
            TimelineError::InvalidDayWidth(_) => ApiError::Invalid(value.to_string()),
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(value: EditorError) -> Self {
        match value {
            EditorError::Persistence(err) => ApiError::from(err),
            EditorError::Timeline(err) => ApiError::from(err),
        }
    }
}

impl From<polars::prelude::PolarsError> for ApiError {
    fn from(value: polars::prelude::PolarsError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ReorderPayload {
    dragged: TaskId,
    target: TaskId,
}

#[derive(Debug, Deserialize)]
struct DragPayload {
    kind: DragKind,
    from_px: f64,
    to_px: f64,
    /// Whether later tasks may be rescheduled when the change affects them.
    #[serde(default)]
    cascade: bool,
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    year: i32,
    month: u32,
}

#[derive(Debug, Deserialize)]
struct KanbanQuery {
    #[serde(default)]
    by: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/:id/stats", get(project_stats))
        .route("/projects/:id/schedule", post(schedule_project))
        .route("/projects/:id/timeline", get(project_timeline))
        .route("/projects/:id/calendar", get(project_calendar))
        .route("/projects/:id/kanban", get(project_kanban))
        .route("/projects/:id/table", get(project_table))
        .route("/projects/:id/reorder", post(reorder_tasks))
        .route("/projects/:id/tasks", get(list_tasks).post(create_task))
        .route(
            "/projects/:id/tasks/:task_id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/projects/:id/tasks/:task_id/status", post(cycle_status))
        .route("/projects/:id/tasks/:task_id/drag", post(drag_task))
        .with_state(state)
}

pub async fn serve<S>(addr: SocketAddr, store: S, timeline: TimelineConfig) -> std::io::Result<()>
where
    S: TaskStore + Send + Sync + 'static,
{
    let state = AppState::new(store, timeline);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    let store = state.store();
    let projects = store.read().list_projects()?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<AppState>,
    Json(draft): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    if draft.name.trim().is_empty() {
        return Err(ApiError::invalid("project name must not be empty"));
    }
    let store = state.store();
    let project = store.write().create_project(draft)?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Project>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, ApiError> {
    let store = state.store();
    let project = store.write().update_project(project_id, &patch)?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, ApiError> {
    let store = state.store();
    let removed = store.write().delete_project(project_id)?;
    if !removed {
        return Err(ApiError::not_found(format!("project {project_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn project_stats(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ProjectStats>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    Ok(Json(project.stats()))
}

async fn schedule_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ScheduleOutcome>, ApiError> {
    let store = state.store();
    let outcome = store.write().apply_schedule(project_id)?;
    Ok(Json(outcome))
}

async fn project_timeline(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<TimelineView>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    TimelineView::build(&project, &state.timeline)?
        .map(Json)
        .ok_or_else(|| ApiError::from(TimelineError::NoProjectStart))
}

async fn project_calendar(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthGrid>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    MonthGrid::build(&project, query.year, query.month)
        .map(Json)
        .ok_or_else(|| ApiError::invalid(format!("invalid month {}-{}", query.year, query.month)))
}

async fn project_kanban(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Query(query): Query<KanbanQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    let columns = match query.by.as_deref().unwrap_or("status") {
        "status" => serde_json::to_value(views::tasks_by_status(&project)),
        "category" => serde_json::to_value(views::tasks_by_category(&project)),
        other => return Err(ApiError::invalid(format!("unknown kanban grouping '{other}'"))),
    };
    columns
        .map(Json)
        .map_err(|err| ApiError::Internal(err.to_string()))
}

async fn project_table(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    let df = views::task_table(&project)?;
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    Ok(Json(json!({ "columns": columns, "rows": df.height() })))
}

async fn reorder_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<ReorderPayload>,
) -> Result<Json<Project>, ApiError> {
    let store = state.store();
    let mut guard = store.write();
    if !guard.reorder_tasks(project_id, payload.dragged, payload.target)? {
        return Err(ApiError::not_found(format!(
            "task {} or {} not found",
            payload.dragged, payload.target
        )));
    }
    let project = guard.get_project(project_id)?;
    Ok(Json(project))
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    Ok(Json(project.ordered_tasks()))
}

async fn create_task(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(draft): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let store = state.store();
    let task = store.write().add_task(project_id, draft)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store();
    let project = store.read().get_project(project_id)?;
    project
        .find_task(task_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("task {task_id} not found")))
}

async fn update_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store();
    let mut guard = store.write();
    guard.update_task(project_id, task_id, &patch)?;
    let project = guard.get_project(project_id)?;
    project
        .find_task(task_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::Internal("task not found after update".into()))
}

async fn delete_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> Result<StatusCode, ApiError> {
    let store = state.store();
    let removed = store.write().delete_task(project_id, task_id)?;
    if !removed {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn cycle_status(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store();
    let mut guard = store.write();
    let project = guard.get_project(project_id)?;
    let task = project
        .find_task(task_id)
        .ok_or_else(|| ApiError::not_found(format!("task {task_id} not found")))?;
    let next = task.status.next();
    guard.update_task(project_id, task_id, &TaskPatch::status(next))?;
    Ok(Json(task.clone().with_status(next)))
}

/// Replays a whole drag gesture: press at `from_px`, release at `to_px`.
async fn drag_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(payload): Json<DragPayload>,
) -> Result<Json<EditOutcome>, ApiError> {
    let geometry = TimelineGeometry::from_config(&state.timeline)?;
    let mut editor = TimelineEditor::new(project_id, geometry);
    let store = state.store();
    let mut guard = store.write();
    editor.pointer_down(&**guard, task_id, payload.kind, payload.from_px)?;
    editor.pointer_move(payload.to_px);
    let decision = if payload.cascade {
        CascadeDecision::Confirmed
    } else {
        CascadeDecision::Declined
    };
    let mut confirm = |_: &CascadePlan| decision;
    let outcome = editor.pointer_up(&mut **guard, payload.to_px, &mut confirm);
    Ok(Json(outcome))
}
