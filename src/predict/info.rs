use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::ephemeris::EphemerisPort;
use crate::predict::error::PredictError;
use crate::predict::observer::Observer;
use crate::predict::types::GeoPoint;

/// Snapshot of a satellite's state as seen from the observer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SatelliteInfo {
    pub name: String,
    pub epoch: DateTime<Utc>,
    pub days_since_epoch: f64,
    pub subpoint: GeoPoint,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub above_horizon: bool,
}

pub fn satellite_info(
    ephemeris: &dyn EphemerisPort,
    name: &str,
    observer: &Observer,
    now: DateTime<Utc>,
) -> Result<SatelliteInfo, PredictError> {
    let epoch = ephemeris.epoch();
    let days_since_epoch = (now - epoch).num_seconds() as f64 / 86_400.0;
    if days_since_epoch < 0.0 {
        log::warn!(
            "{}: element set epoch {} is {:.3} days after {}",
            name,
            epoch,
            -days_since_epoch,
            now
        );
    }

    let subpoint = ephemeris.subpoint(now)?;
    let look = ephemeris.topocentric(observer, now)?;

    Ok(SatelliteInfo {
        name: name.to_string(),
        epoch,
        days_since_epoch,
        subpoint,
        azimuth_deg: look.azimuth_deg,
        elevation_deg: look.elevation_deg,
        range_km: look.range_km,
        above_horizon: look.elevation_deg > 0.0,
    })
}
