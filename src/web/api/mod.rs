pub mod error;
pub mod job;
pub mod passes;
pub mod satellites;
pub mod views;

use crate::catalog::Catalog;
use crate::predict::Observer;
use crate::web::api::error::ApiResult;
use crate::web::auth::AppState;

/// Catalog and observer are read per request so file edits apply without a restart.
pub(crate) fn load_catalog(state: &AppState) -> ApiResult<Catalog> {
    Ok(Catalog::load(&state.config.catalog.path)?)
}

pub(crate) fn station_observer(state: &AppState) -> ApiResult<Observer> {
    Ok(state.config.station.observer()?)
}
