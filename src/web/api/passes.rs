use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::{
    window_ahead, LocalTimeResolver, Observer, Pass, PassPredictor, SolarResolver,
};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::{load_catalog, station_observer};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::{Permission, StationConfig};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PassesQuery {
    pub min_elevation: Option<f64>,
    pub window_hours: Option<f64>,
    pub satellite: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassesResponse {
    pub observer: Observer,
    pub utc_offset_hours: f64,
    pub satellite_count: usize,
    pub passes: Vec<Pass>,
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(
        ("min_elevation" = Option<f64>, Query, description = "Elevation threshold (degrees)"),
        ("window_hours" = Option<f64>, Query, description = "Look-ahead window from now (hours)"),
        ("satellite" = Option<String>, Query, description = "Restrict to one catalog satellite"),
        ("longitude" = Option<f64>, Query, description = "Observer longitude override (degrees)"),
        ("latitude" = Option<f64>, Query, description = "Observer latitude override (degrees)")
    ),
    responses(
        (status = 200, description = "Passes sorted by rise time", body = PassesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 502, description = "Timezone lookup failed", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn list_passes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassesResponse>> {
    require_permission(&user, Permission::ComputePasses)?;

    let defaults = &state.config.predict;
    let min_elevation = query.min_elevation.unwrap_or(defaults.default_min_elevation);
    let window_hours = query.window_hours.unwrap_or(defaults.default_window_hours);
    if !min_elevation.is_finite() {
        return Err(ApiError::Validation("min_elevation must be finite".into()));
    }
    let (start, end) = window_ahead(Utc::now(), window_hours)?;

    let (observer, resolver) = match query_observer(&query)? {
        Some(observer) => (observer, Box::new(SolarResolver) as Box<dyn LocalTimeResolver>),
        None => (station_observer(&state)?, station_resolver(&state.config.station)?),
    };
    let utc_offset_hours = resolver.offset_hours(&observer)?;

    let catalog = load_catalog(&state)?;
    let entries: Vec<_> = match &query.satellite {
        Some(name) => vec![catalog
            .get(name)
            .ok_or_else(|| ApiError::SatelliteNotFound(name.clone()))?],
        None => catalog.entries().iter().collect(),
    };

    let predictor = PassPredictor::new(defaults.bearing_resolution);

    let mut passes = Vec::new();
    let mut satellite_count = 0;
    for entry in entries {
        let result = predictor.predict(
            entry.ephemeris.as_ref(),
            entry.name(),
            Some(entry.ephemeris.norad_id()),
            &observer,
            min_elevation,
            start,
            end,
            utc_offset_hours,
        );
        match result {
            Ok(found) => {
                satellite_count += usize::from(!found.is_empty());
                passes.extend(found);
            }
            Err(e) if query.satellite.is_some() => return Err(e.into()),
            Err(e) => log::warn!("{}: skipping pass prediction: {}", entry.name(), e),
        }
    }
    passes.sort_by_key(|p| p.rise_time);

    Ok(Json(PassesResponse {
        observer,
        utc_offset_hours,
        satellite_count,
        passes,
    }))
}

/// Observer given in the query string, if any. Both coordinates must be present.
fn query_observer(query: &PassesQuery) -> ApiResult<Option<Observer>> {
    match (query.longitude, query.latitude) {
        (None, None) => Ok(None),
        (Some(lon), Some(lat)) => Observer::from_coordinates(&format!("{lon},{lat}"), None)
            .map(Some)
            .ok_or_else(|| ApiError::Validation(format!("coordinates {lon},{lat} out of range"))),
        _ => Err(ApiError::Validation(
            "longitude and latitude must be given together".into(),
        )),
    }
}

fn station_resolver(station: &StationConfig) -> ApiResult<Box<dyn LocalTimeResolver>> {
    Ok(station.time_resolver()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::PredictError;
    use crate::web::auth::tests::state_from_yaml;
    use std::collections::HashSet;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            key_name: "planner".into(),
            permissions: HashSet::from([Permission::ComputePasses]),
        }
    }

    async fn passes_with_window(window_hours: f64) -> ApiResult<Json<PassesResponse>> {
        let state = state_from_yaml(
            r#"
station:
  coordinates: "18.5627,54.408"
catalog:
  path: /nonexistent/sat-flyby/tle.cfg
render:
  output_dir: out
"#,
        );
        let query = PassesQuery {
            window_hours: Some(window_hours),
            ..PassesQuery::default()
        };
        list_passes(State(state), user(), Query(query)).await
    }

    #[tokio::test]
    async fn bad_windows_are_rejected_before_any_satellite_is_tried() {
        for hours in [0.0, -3.0, 1e300, f64::NAN] {
            assert!(matches!(
                passes_with_window(hours).await,
                Err(ApiError::Predict(PredictError::InvalidWindow(_)))
            ));
        }
        // a valid window gets as far as the missing catalog
        assert!(matches!(
            passes_with_window(24.0).await,
            Err(ApiError::Catalog(_))
        ));
    }

    #[test]
    fn query_coordinates_override_the_station() {
        let query = PassesQuery {
            longitude: Some(18.5627),
            latitude: Some(54.408),
            ..PassesQuery::default()
        };
        let observer = query_observer(&query).ok().flatten().unwrap();
        assert_eq!(observer.longitude_deg, 18.5627);
        assert_eq!(observer.latitude_deg, 54.408);

        assert!(matches!(query_observer(&PassesQuery::default()), Ok(None)));
    }

    #[test]
    fn partial_or_invalid_coordinates_are_rejected() {
        let partial = PassesQuery {
            longitude: Some(10.0),
            ..PassesQuery::default()
        };
        assert!(matches!(
            query_observer(&partial),
            Err(ApiError::Validation(_))
        ));

        let out_of_range = PassesQuery {
            longitude: Some(10.0),
            latitude: Some(91.0),
            ..PassesQuery::default()
        };
        assert!(matches!(
            query_observer(&out_of_range),
            Err(ApiError::Validation(_))
        ));
    }
}
