use chrono::{DateTime, Duration, Utc};

use crate::predict::{BearingPoint, EphemerisPort, GeoPoint, Observer, PredictError};
use crate::track::segment::{map_points, polar_points, PlotPoint, Seam};

/// What a track is sampled from.
#[derive(Debug, Clone, Copy)]
pub enum TrackSource<'a> {
    Geo,
    Bearing(&'a Observer),
}

#[derive(Debug, Clone)]
pub enum Track {
    Geo(Vec<GeoPoint>),
    Bearing(Vec<BearingPoint>),
}

impl Track {
    /// Map coordinates for ground tracks, polar coordinates for bearing tracks.
    pub fn plot_points(&self) -> Vec<PlotPoint> {
        match self {
            Track::Geo(points) => map_points(points),
            Track::Bearing(points) => polar_points(points),
        }
    }

    pub fn seam(&self) -> Seam {
        match self {
            Track::Geo(_) => Seam::Antimeridian,
            Track::Bearing(_) => Seam::Azimuth,
        }
    }
}

/// Samples `resolution` points over `[t0, t1)`, spaced `(t1 - t0) / resolution` apart.
///
/// Each instant is derived from the sample index rather than by accumulating a step, so
/// rounding never drifts. The ephemeris is queried once per sample in increasing time
/// order.
pub fn sample(
    ephemeris: &dyn EphemerisPort,
    source: TrackSource<'_>,
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
    resolution: usize,
) -> Result<Track, PredictError> {
    match source {
        TrackSource::Geo => sample_geo(ephemeris, t0, t1, resolution).map(Track::Geo),
        TrackSource::Bearing(observer) => {
            sample_bearing(ephemeris, observer, t0, t1, resolution).map(Track::Bearing)
        }
    }
}

pub fn sample_geo(
    ephemeris: &dyn EphemerisPort,
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
    resolution: usize,
) -> Result<Vec<GeoPoint>, PredictError> {
    instants(t0, t1, resolution)?
        .map(|t| ephemeris.subpoint(t))
        .collect()
}

pub fn sample_bearing(
    ephemeris: &dyn EphemerisPort,
    observer: &Observer,
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
    resolution: usize,
) -> Result<Vec<BearingPoint>, PredictError> {
    instants(t0, t1, resolution)?
        .map(|t| ephemeris.topocentric(observer, t).map(BearingPoint::from))
        .collect()
}

fn instants(
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
    resolution: usize,
) -> Result<impl Iterator<Item = DateTime<Utc>>, PredictError> {
    if resolution < 2 {
        return Err(PredictError::InvalidResolution(resolution));
    }
    if t1 <= t0 {
        return Err(PredictError::empty_window(t0, t1));
    }

    let span_us = (t1 - t0)
        .num_microseconds()
        .ok_or_else(|| PredictError::InvalidWindow(format!("{t0} to {t1} is too long")))?
        as i128;
    let n = resolution as i128;

    Ok((0..n).map(move |i| t0 + Duration::microseconds((span_us * i / n) as i64)))
}
