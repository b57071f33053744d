use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::predict::{Observer, SatelliteInfo};
use crate::track::footprint::FootprintPolygon;
use crate::track::segment::Segment;

pub const TRACK_COLOR: &str = "red";
pub const FOOTPRINT_COLOR: &str = "blue";
pub const FOOTPRINT_FILL_OPACITY: f64 = 0.3;

/// Everything a renderer needs to draw one satellite's map and radar plot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenderedView {
    pub satellite: SatelliteInfo,
    pub observer: Observer,
    /// Ground track runs in `(lon, lat)`.
    pub map_runs: Vec<Segment>,
    /// Bearing track runs in `(theta, zenith distance)`.
    pub polar_runs: Vec<Segment>,
    pub footprint: Option<FootprintPolygon>,
    pub track_color: String,
    pub footprint_color: String,
    pub footprint_fill_opacity: f64,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Consumer of finished views. Implementations own the output medium.
pub trait RenderSink: Send + Sync {
    /// Returns where the view ended up.
    fn render(&self, view: &RenderedView) -> Result<String, RenderError>;
}

/// Writes each view as `<output_dir>/<satellite>.json`, replacing the previous one.
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(output_dir: PathBuf) -> Self {
        JsonFileSink { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn view_path(&self, satellite: &str) -> PathBuf {
        let file_stem: String = satellite
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.output_dir.join(format!("{}.json", file_stem))
    }
}

impl RenderSink for JsonFileSink {
    fn render(&self, view: &RenderedView) -> Result<String, RenderError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.view_path(&view.satellite.name);
        let json = serde_json::to_string_pretty(view)?;
        fs::write(&path, json)?;
        log::debug!("wrote view of {} to {}", view.satellite.name, path.display());
        Ok(path.display().to_string())
    }
}
