use thiserror::Error;

use crate::predict::PredictError;
use crate::track::render::RenderError;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("insufficient points for a footprint: {0} (at least 3 required)")]
    InsufficientPoints(usize),
    #[error("degenerate footprint hull, all points are collinear")]
    DegenerateHull,
    #[error("invalid footprint grid resolution {0}")]
    InvalidGridResolution(f64),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}
