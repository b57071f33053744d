use axum::{extract::State, Json};
use chrono::Utc;

use crate::predict::{satellite_info, SatelliteInfo};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::api::{load_catalog, station_observer};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[utoipa::path(
    get,
    path = "/api/satellites",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Current state of every catalog satellite", body = Vec<SatelliteInfo>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Catalog or observer file unreadable", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn list_satellites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<SatelliteInfo>>> {
    require_permission(&user, Permission::ComputePasses)?;

    let catalog = load_catalog(&state)?;
    let observer = station_observer(&state)?;
    let now = Utc::now();

    let mut satellites = Vec::with_capacity(catalog.len());
    for entry in catalog.entries() {
        match satellite_info(entry.ephemeris.as_ref(), entry.name(), &observer, now) {
            Ok(info) => satellites.push(info),
            Err(e) => log::warn!("{}: no current state: {}", entry.name(), e),
        }
    }

    Ok(Json(satellites))
}
