use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::track::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Rise,
    Culminate,
    Set,
}

/// A threshold crossing or elevation maximum seen from the observer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Event {
    pub kind: EventKind,
    pub time: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Sub-satellite point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeoPoint {
    pub timestamp: DateTime<Utc>,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub altitude_km: f64,
}

/// Observer-relative direction of the satellite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct BearingPoint {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Topocentric {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
}

impl From<Topocentric> for BearingPoint {
    fn from(t: Topocentric) -> Self {
        BearingPoint {
            timestamp: t.timestamp,
            azimuth_deg: t.azimuth_deg,
            elevation_deg: t.elevation_deg,
        }
    }
}

/// A predicted satellite pass. Times carry the observer-local offset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pass {
    pub satellite: String,
    pub norad_id: Option<u64>,
    #[schema(value_type = String)]
    pub rise_time: DateTime<FixedOffset>,
    #[schema(value_type = String)]
    pub culminate_time: DateTime<FixedOffset>,
    #[schema(value_type = String)]
    pub set_time: DateTime<FixedOffset>,
    pub max_elevation_deg: f64,
    pub rise_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
    pub duration_seconds: i64,
    pub bearing_track: Vec<BearingPoint>,
    pub segments: Vec<Segment>,
}
