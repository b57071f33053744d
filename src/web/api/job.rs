use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::job::{JobStatus, StartOutcome, ViewTask};
use crate::predict::{window_around, EphemerisPort};
use crate::track::ViewSettings;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::{load_catalog, station_observer};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Serialize, ToSchema)]
pub struct JobStarted {
    pub run_id: Uuid,
    pub satellites: usize,
}

#[utoipa::path(
    post,
    path = "/api/job/start",
    request_body = ViewSettings,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 202, description = "Job accepted", body = JobStarted),
        (status = 400, description = "Invalid time window", body = ErrorResponse),
        (status = 409, description = "A job is already running", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "job"
)]
pub async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(settings): Json<ViewSettings>,
) -> ApiResult<(StatusCode, Json<JobStarted>)> {
    require_permission(&user, Permission::ControlJob)?;
    window_around(
        Utc::now(),
        settings.before_time_seconds,
        settings.after_time_seconds,
    )?;

    let catalog = load_catalog(&state)?;
    let observer = station_observer(&state)?;
    let tasks: Vec<ViewTask> = catalog
        .entries()
        .iter()
        .map(|entry| ViewTask {
            name: entry.name().to_string(),
            ephemeris: entry.ephemeris.clone() as Arc<dyn EphemerisPort>,
            settings: settings.clone(),
        })
        .collect();
    let satellites = tasks.len();

    match state.job.start(tasks, observer, state.sink.clone()) {
        StartOutcome::Accepted { run_id } => Ok((
            StatusCode::ACCEPTED,
            Json(JobStarted { run_id, satellites }),
        )),
        StartOutcome::Busy => Err(ApiError::JobRunning),
    }
}

#[utoipa::path(
    post,
    path = "/api/job/stop",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Stop requested (no effect when idle)", body = JobStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "job"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<JobStatus>> {
    require_permission(&user, Permission::ControlJob)?;
    state.job.stop();
    Ok(Json(state.job.status()))
}

#[utoipa::path(
    get,
    path = "/api/job/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Job state and latest report", body = JobStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "job"
)]
pub async fn status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<JobStatus>> {
    Ok(Json(state.job.status()))
}
