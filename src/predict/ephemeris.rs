use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::observer::{Observer, EARTH_ROTATION_RAD_S, WGS84_A_KM, WGS84_E2};
use crate::predict::types::{GeoPoint, Topocentric};

/// Position source for one satellite.
///
/// Calls are treated as blocking and are always issued in increasing time order by the
/// samplers and the event detector.
pub trait EphemerisPort: Send + Sync {
    fn subpoint(&self, t: DateTime<Utc>) -> Result<GeoPoint, PredictError>;

    fn topocentric(
        &self,
        observer: &Observer,
        t: DateTime<Utc>,
    ) -> Result<Topocentric, PredictError>;

    fn epoch(&self) -> DateTime<Utc>;
}

/// SGP4 propagation of a two-line element set.
pub struct Sgp4Ephemeris {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Ephemeris {
    pub fn from_elements(elements: Elements) -> Result<Self, sgp4::ElementsError> {
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    /// Satellite position and velocity in the Earth-fixed frame (km, km/s).
    fn propagate_ecef(&self, t: DateTime<Utc>) -> Result<([f64; 3], [f64; 3]), PredictError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&t.naive_utc())
            .map_err(|e| PredictError::EphemerisUnavailable(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PredictError::EphemerisUnavailable(e.to_string()))?;

        let sidereal =
            sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&t.naive_utc()));

        Ok((
            teme_to_ecef_position(prediction.position, sidereal),
            teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal),
        ))
    }
}

impl EphemerisPort for Sgp4Ephemeris {
    fn subpoint(&self, t: DateTime<Utc>) -> Result<GeoPoint, PredictError> {
        let (pos, _) = self.propagate_ecef(t)?;
        let (longitude_deg, latitude_deg, altitude_km) = ecef_to_geodetic(pos);
        Ok(GeoPoint {
            timestamp: t,
            longitude_deg,
            latitude_deg,
            altitude_km,
        })
    }

    fn topocentric(
        &self,
        observer: &Observer,
        t: DateTime<Utc>,
    ) -> Result<Topocentric, PredictError> {
        let (sat_ecef, sat_vel_ecef) = self.propagate_ecef(t)?;
        Ok(look_angles(observer, sat_ecef, sat_vel_ecef, t))
    }

    fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }
}

pub fn look_angles(
    observer: &Observer,
    sat_ecef: [f64; 3],
    sat_vel_ecef: [f64; 3],
    timestamp: DateTime<Utc>,
) -> Topocentric {
    let sta_ecef = observer.position_ecef_km();
    let sta_vel = observer.velocity_ecef_km_s();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (up / range_km).asin().to_degrees()
    } else {
        0.0
    };

    let range_rate_km_s = if range_km > 0.0 {
        let rel_vel = [
            sat_vel_ecef[0] - sta_vel[0],
            sat_vel_ecef[1] - sta_vel[1],
            sat_vel_ecef[2] - sta_vel[2],
        ];
        (rel_vel[0] * dr[0] + rel_vel[1] * dr[1] + rel_vel[2] * dr[2]) / range_km
    } else {
        0.0
    };

    Topocentric {
        timestamp,
        azimuth_deg,
        elevation_deg,
        range_km,
        range_rate_km_s,
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Earth-fixed position to `(longitude_deg, latitude_deg, altitude_km)` on WGS-84.
pub fn ecef_to_geodetic(pos: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = pos;
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);

    if p < 1e-9 {
        let b = WGS84_A_KM * (1.0 - WGS84_E2).sqrt();
        let lat = if z >= 0.0 { 90.0 } else { -90.0 };
        return (lon.to_degrees(), lat, z.abs() - b);
    }

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut alt = 0.0;
    for _ in 0..8 {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        alt = p / lat.cos() - n;
        lat = z.atan2(p * (1.0 - WGS84_E2 * n / (n + alt)));
    }

    (lon.to_degrees(), lat.to_degrees(), alt)
}
