//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{EventRecord, TaskSnapshot};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Restrict to one stored event type, e.g. `appeal_contribution`.
    pub event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    /// Restrict to one task status, e.g. `InDispute`.
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct TasksResponse {
    pub count: usize,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: String,
    pub ledger: i64,
    pub task: Value,
}

impl TaskSummary {
    fn from_snapshot(snapshot: TaskSnapshot) -> Result<Self, IndexerError> {
        Ok(Self {
            task: serde_json::from_str(&snapshot.payload)?,
            task_id: snapshot.task_id,
            status: snapshot.status,
            ledger: snapshot.ledger,
        })
    }
}

#[derive(Serialize)]
pub struct TaskEventsResponse {
    pub task_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct TaskStateResponse {
    pub task_id: String,
    pub task: Value,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(e: IndexerError) -> Response {
    let status = match e {
        IndexerError::TaskNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /tasks/:id/events`
///
/// Returns the task's full event history in chain order.
pub async fn get_task_events(
    State(state): State<Arc<ApiState>>,
    Path(task_id): Path<String>,
) -> Response {
    match db::get_events_for_task(&state.pool, &task_id).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(TaskEventsResponse {
                    task_id,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// `GET /tasks/:id/state`
///
/// Returns the latest published task value. Clients pass it back to the
/// contract along with the task ID.
pub async fn get_task_state(
    State(state): State<Arc<ApiState>>,
    Path(task_id): Path<String>,
) -> Response {
    let payload = match db::get_task_state(&state.pool, &task_id).await {
        Ok(payload) => payload,
        Err(e) => return error_response(e),
    };
    match serde_json::from_str::<Value>(&payload) {
        Ok(task) => (StatusCode::OK, Json(TaskStateResponse { task_id, task })).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// `GET /tasks[?status=…]`
///
/// Returns the newest value of every indexed task.
pub async fn list_tasks(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<TasksQuery>,
) -> Response {
    let snapshots = match db::get_task_states(&state.pool, query.status.as_deref()).await {
        Ok(snapshots) => snapshots,
        Err(e) => return error_response(e),
    };
    match snapshots
        .into_iter()
        .map(TaskSummary::from_snapshot)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(tasks) => {
            let count = tasks.len();
            (StatusCode::OK, Json(TasksResponse { count, tasks })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// `GET /events[?event_type=…]`
///
/// Returns all indexed events across all tasks.
pub async fn get_all_events(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EventsQuery>,
) -> Response {
    match db::get_all_events(&state.pool, query.event_type.as_deref()).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(AllEventsResponse { count, events })).into_response()
        }
        Err(e) => error_response(e),
    }
}
