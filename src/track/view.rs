use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::{satellite_info, window_around, EphemerisPort, Observer};
use crate::track::error::TrackError;
use crate::track::footprint::{visible_points, FootprintBuilder};
use crate::track::render::{
    RenderSink, RenderedView, FOOTPRINT_COLOR, FOOTPRINT_FILL_OPACITY, TRACK_COLOR,
};
use crate::track::sampler::{sample, TrackSource};
use crate::track::segment::{Segment, Segmenter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ViewSettings {
    /// Grid points per degree of the day/night scan.
    pub sun_resolution: f64,
    /// Grid points per degree of the footprint scan.
    pub satellite_resolution: f64,
    /// Samples along the track.
    pub path_resolution: usize,
    pub before_time_seconds: i64,
    pub after_time_seconds: i64,
    pub draw_satellite_footprint: bool,
    pub draw_sun_zone: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sun_resolution: 0.1,
            satellite_resolution: 0.1,
            path_resolution: 100,
            before_time_seconds: 0,
            after_time_seconds: 3600,
            draw_satellite_footprint: false,
            draw_sun_zone: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ViewRequest {
    pub satellite_name: String,
    #[serde(flatten)]
    pub settings: ViewSettings,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ViewSummary {
    pub satellite: String,
    pub map_runs: usize,
    pub polar_runs: usize,
    pub footprint_vertices: Option<usize>,
    pub sun_zone_rendered: bool,
    pub artifact: String,
}

/// Samples, segments and optionally outlines one satellite around `now`.
pub fn build_view(
    ephemeris: &dyn EphemerisPort,
    name: &str,
    observer: &Observer,
    settings: &ViewSettings,
    now: DateTime<Utc>,
) -> Result<RenderedView, TrackError> {
    let (start, end) =
        window_around(now, settings.before_time_seconds, settings.after_time_seconds)?;

    let info = satellite_info(ephemeris, name, observer, now)?;

    let runs = |source: TrackSource<'_>| -> Result<Vec<Segment>, TrackError> {
        let track = sample(ephemeris, source, start, end, settings.path_resolution)?;
        Ok(Segmenter::new(track.seam()).split(&track.plot_points()))
    };
    let map_runs = runs(TrackSource::Geo)?;
    let polar_runs = runs(TrackSource::Bearing(observer))?;

    let footprint = if settings.draw_satellite_footprint {
        let points = visible_points(ephemeris, now, settings.satellite_resolution)?;
        match FootprintBuilder.build(&points) {
            Ok(polygon) => Some(polygon),
            Err(e) => {
                log::warn!("{}: no footprint: {}", name, e);
                return Err(e);
            }
        }
    } else {
        None
    };

    if settings.draw_sun_zone {
        log::info!("{}: day/night zone requested but not rendered", name);
    }

    Ok(RenderedView {
        satellite: info,
        observer: *observer,
        map_runs,
        polar_runs,
        footprint,
        track_color: TRACK_COLOR.to_string(),
        footprint_color: FOOTPRINT_COLOR.to_string(),
        footprint_fill_opacity: FOOTPRINT_FILL_OPACITY,
    })
}

pub fn render_view(
    ephemeris: &dyn EphemerisPort,
    name: &str,
    observer: &Observer,
    settings: &ViewSettings,
    now: DateTime<Utc>,
    sink: &dyn RenderSink,
) -> Result<ViewSummary, TrackError> {
    let view = build_view(ephemeris, name, observer, settings, now)?;
    let artifact = sink.render(&view)?;

    Ok(ViewSummary {
        satellite: name.to_string(),
        map_runs: view.map_runs.len(),
        polar_runs: view.polar_runs.len(),
        footprint_vertices: view.footprint.as_ref().map(|f| f.corner_count()),
        sun_zone_rendered: false,
        artifact,
    })
}
