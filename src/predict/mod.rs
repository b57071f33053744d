mod ephemeris;
mod error;
mod events;
mod info;
mod local_time;
mod observer;
mod passes;
mod types;

pub use ephemeris::{EphemerisPort, Sgp4Ephemeris};
pub use error::{window_ahead, window_around, PredictError};
pub use info::{satellite_info, SatelliteInfo};
pub use local_time::{FixedResolver, LocalTimeResolver, SolarResolver, ZoneResolver};
pub use observer::Observer;
pub use passes::{PassPredictor, DEFAULT_BEARING_RESOLUTION};
pub use types::{BearingPoint, GeoPoint, Pass, Topocentric};

#[cfg(test)]
pub(crate) use events::tests as fakes;
