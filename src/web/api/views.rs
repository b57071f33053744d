use axum::{extract::State, Json};
use chrono::Utc;

use crate::track::{render_view, ViewRequest, ViewSummary};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::{load_catalog, station_observer};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[utoipa::path(
    post,
    path = "/api/views",
    request_body = ViewRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "View rendered", body = ViewSummary),
        (status = 400, description = "Invalid window or resolution", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 422, description = "Footprint could not be built", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "views"
)]
pub async fn render(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ViewRequest>,
) -> ApiResult<Json<ViewSummary>> {
    require_permission(&user, Permission::RenderViews)?;

    let catalog = load_catalog(&state)?;
    let entry = catalog
        .get(&request.satellite_name)
        .ok_or_else(|| ApiError::SatelliteNotFound(request.satellite_name.clone()))?;
    let observer = station_observer(&state)?;

    let summary = render_view(
        entry.ephemeris.as_ref(),
        entry.name(),
        &observer,
        &request.settings,
        Utc::now(),
        state.sink.as_ref(),
    )?;

    Ok(Json(summary))
}
