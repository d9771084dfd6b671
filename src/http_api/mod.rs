use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    DayStatus, FailureRecord, Habit, HabitError, HabitId, HabitSummary, HabitTracker,
    MonthCalendar, NewHabit, RecordId, UpsertOutcome, validation,
};

mod auth;

pub use auth::SessionGate;

#[derive(Clone)]
pub struct AppState {
    tracker: HabitTracker,
    sessions: Arc<SessionGate>,
}

impl AppState {
    pub fn new(tracker: HabitTracker, sessions: SessionGate) -> Self {
        Self {
            tracker,
            sessions: Arc::new(sessions),
        }
    }

    /// State without a password gate.
    pub fn open(tracker: HabitTracker) -> Self {
        Self::new(tracker, SessionGate::open())
    }

    fn tracker(&self) -> &HabitTracker {
        &self.tracker
    }

    fn sessions(&self) -> &SessionGate {
        &self.sessions
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    NotFound(String),
    Invalid(String),
    Temporal(String),
    Unauthorized(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<HabitError> for ApiError {
    fn from(value: HabitError) -> Self {
        match value {
            HabitError::Validation(_) | HabitError::InvalidCalendarPeriod { .. } => {
                ApiError::Invalid(value.to_string())
            }
            HabitError::HabitNotFound(_) | HabitError::RecordNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            HabitError::TemporalConstraint(_) => ApiError::Temporal(value.to_string()),
            HabitError::Persistence(err) => {
                error!(error = %err, "store failure");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<validation::ValidationError> for ApiError {
    fn from(value: validation::ValidationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message, redirect) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message, None),
            ApiError::Invalid(message) => {
                (StatusCode::BAD_REQUEST, "invalid_request", message, None)
            }
            ApiError::Temporal(message) => {
                (StatusCode::BAD_REQUEST, "temporal_constraint", message, None)
            }
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                message,
                Some("/login"),
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                None,
            ),
        };
        let body = Json(ErrorBody {
            error,
            message,
            redirect,
        });
        (status, body).into_response()
    }
}

/// A failure record as sent over the wire, tagged with its day status.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordBody {
    #[serde(flatten)]
    pub record: FailureRecord,
    pub status: DayStatus,
}

impl From<FailureRecord> for RecordBody {
    fn from(record: FailureRecord) -> Self {
        Self {
            record,
            status: DayStatus::Fail,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateHabitPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarkFailPayload {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateRecordPayload {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/:id", get(get_habit).delete(delete_habit))
        .route("/habits/:id/calendar", get(get_calendar))
        .route("/habits/:id/records", get(list_records).post(mark_fail))
        .route("/records/:id", put(update_record).delete(delete_record))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_habits(State(state): State<AppState>) -> Result<Json<Vec<HabitSummary>>, ApiError> {
    Ok(Json(state.tracker().list_habits()?))
}

async fn create_habit(
    State(state): State<AppState>,
    payload: Result<Json<CreateHabitPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let Json(payload) = payload?;
    let name = validation::require_text("name", payload.name.as_deref())?;
    let start_date = validation::parse_optional_date("start_date", payload.start_date.as_deref())?;
    let input = NewHabit {
        name,
        description: payload.description,
        start_date,
    };
    let habit = state.tracker().create_habit(input)?;
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn get_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
) -> Result<Json<HabitSummary>, ApiError> {
    Ok(Json(state.tracker().habit_summary(habit_id)?))
}

async fn delete_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tracker().delete_habit(habit_id)?;
    Ok(Json(json!({ "message": format!("habit {habit_id} deleted") })))
}

async fn get_calendar(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Json<MonthCalendar>, ApiError> {
    let Query(query) = query?;
    let calendar = state
        .tracker()
        .calendar(habit_id, query.year, query.month)?;
    Ok(Json(calendar))
}

async fn list_records(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
) -> Result<Json<Vec<RecordBody>>, ApiError> {
    let records = state.tracker().records(habit_id)?;
    Ok(Json(records.into_iter().map(RecordBody::from).collect()))
}

async fn mark_fail(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
    payload: Result<Json<MarkFailPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordBody>), ApiError> {
    let Json(payload) = payload?;
    let date = validation::require_text("date", payload.date.as_deref())?;
    let date = validation::parse_date("date", &date)?;
    let reason = payload.reason.unwrap_or_default();

    let (record, outcome) = state.tracker().mark_fail(habit_id, date, &reason)?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(RecordBody::from(record))))
}

async fn update_record(
    State(state): State<AppState>,
    Path(record_id): Path<RecordId>,
    payload: Result<Json<UpdateRecordPayload>, JsonRejection>,
) -> Result<Json<RecordBody>, ApiError> {
    let Json(payload) = payload?;
    let reason = payload.reason.unwrap_or_default();
    let record = state.tracker().update_record_reason(record_id, &reason)?;
    Ok(Json(RecordBody::from(record)))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(record_id): Path<RecordId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tracker().delete_record(record_id)?;
    Ok(Json(
        json!({ "message": format!("record {record_id} deleted; the day counts as a success again") }),
    ))
}
