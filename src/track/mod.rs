mod error;
mod footprint;
mod render;
mod sampler;
mod segment;
mod view;

pub use error::TrackError;
pub use render::{JsonFileSink, RenderSink};
pub use sampler::sample_bearing;
pub use segment::{polar_points, PlotPoint, Seam, Segment, Segmenter};
pub use view::{render_view, ViewRequest, ViewSettings, ViewSummary};

#[cfg(test)]
pub(crate) use render::tests::MemorySink;
