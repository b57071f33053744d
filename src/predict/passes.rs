use chrono::{DateTime, FixedOffset, Utc};

use crate::predict::ephemeris::EphemerisPort;
use crate::predict::error::PredictError;
use crate::predict::events::PassEventDetector;
use crate::predict::local_time::fixed_offset;
use crate::predict::observer::Observer;
use crate::predict::types::{Event, EventKind, Pass};
use crate::track::{polar_points, sample_bearing, Seam, Segmenter};

pub const DEFAULT_BEARING_RESOLUTION: usize = 50;

/// Groups detector events into complete Rise → Culminate → Set passes.
#[derive(Debug, Clone)]
pub struct PassAssembler {
    pub bearing_resolution: usize,
}

impl Default for PassAssembler {
    fn default() -> Self {
        Self {
            bearing_resolution: DEFAULT_BEARING_RESOLUTION,
        }
    }
}

impl PassAssembler {
    /// Events preceding the first Rise belong to an encounter that was already in
    /// progress when the window opened and are dropped, as is a trailing incomplete
    /// triple. Any other ordering is rejected.
    pub fn assemble(
        &self,
        ephemeris: &dyn EphemerisPort,
        observer: &Observer,
        satellite: &str,
        norad_id: Option<u64>,
        events: Vec<Event>,
        offset: FixedOffset,
    ) -> Result<Vec<Pass>, PredictError> {
        let mut passes = Vec::new();
        let mut pending: Vec<Event> = Vec::with_capacity(3);
        let mut seen_rise = false;

        for event in events {
            match (pending.len(), event.kind) {
                (0, EventKind::Rise) => {
                    seen_rise = true;
                    pending.push(event);
                }
                (1, EventKind::Culminate) => pending.push(event),
                (2, EventKind::Set) => {
                    pending.push(event);
                    let triple: Vec<Event> = std::mem::take(&mut pending);
                    passes.push(self.build_pass(
                        ephemeris, observer, satellite, norad_id, &triple, offset,
                    )?);
                }
                (0, kind) if !seen_rise => {
                    log::warn!(
                        "{}: dropping {} at {} of a pass already in progress at window start",
                        satellite,
                        kind,
                        event.time
                    );
                }
                (n, kind) => {
                    return Err(PredictError::MalformedEventSequence(format!(
                        "{satellite}: unexpected {kind} at {} after {n} event(s) of a pass",
                        event.time
                    )));
                }
            }
        }

        if !pending.is_empty() {
            log::warn!(
                "{}: dropping incomplete pass rising at {} (window closed before set)",
                satellite,
                pending[0].time
            );
        }

        Ok(passes)
    }

    fn build_pass(
        &self,
        ephemeris: &dyn EphemerisPort,
        observer: &Observer,
        satellite: &str,
        norad_id: Option<u64>,
        triple: &[Event],
        offset: FixedOffset,
    ) -> Result<Pass, PredictError> {
        let (rise, culminate, set) = (&triple[0], &triple[1], &triple[2]);
        if !(rise.time < culminate.time && culminate.time < set.time) {
            return Err(PredictError::MalformedEventSequence(format!(
                "{satellite}: events out of order ({} / {} / {})",
                rise.time, culminate.time, set.time
            )));
        }

        let bearing_track = sample_bearing(
            ephemeris,
            observer,
            rise.time,
            set.time,
            self.bearing_resolution,
        )?;
        let segments = Segmenter::new(Seam::Azimuth).split(&polar_points(&bearing_track));

        Ok(Pass {
            satellite: satellite.to_string(),
            norad_id,
            rise_time: rise.time.with_timezone(&offset),
            culminate_time: culminate.time.with_timezone(&offset),
            set_time: set.time.with_timezone(&offset),
            max_elevation_deg: round2(culminate.elevation_deg),
            rise_azimuth_deg: round2(rise.azimuth_deg),
            set_azimuth_deg: round2(set.azimuth_deg),
            duration_seconds: (set.time - rise.time).num_seconds(),
            bearing_track,
            segments,
        })
    }
}

/// Event detection and pass assembly for one satellite.
#[derive(Debug, Clone, Default)]
pub struct PassPredictor {
    pub detector: PassEventDetector,
    pub assembler: PassAssembler,
}

impl PassPredictor {
    pub fn new(bearing_resolution: usize) -> Self {
        Self {
            detector: PassEventDetector::default(),
            assembler: PassAssembler { bearing_resolution },
        }
    }

    /// `offset_hours` is resolved once by the caller for the whole request.
    #[allow(clippy::too_many_arguments)]
    pub fn predict(
        &self,
        ephemeris: &dyn EphemerisPort,
        satellite: &str,
        norad_id: Option<u64>,
        observer: &Observer,
        min_elevation_deg: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset_hours: f64,
    ) -> Result<Vec<Pass>, PredictError> {
        let offset = fixed_offset(offset_hours)?;
        let events = self
            .detector
            .detect(ephemeris, observer, min_elevation_deg, start, end)?;
        log::debug!("{}: {} events in window", satellite, events.len());
        self.assembler
            .assemble(ephemeris, observer, satellite, norad_id, events, offset)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::ephemeris::Sgp4Ephemeris;
    use crate::predict::events::tests::{t0, ArcEphemeris};
    use chrono::Duration;

    fn event(kind: EventKind, seconds: i64) -> Event {
        Event {
            kind,
            time: t0() + Duration::seconds(seconds),
            azimuth_deg: 0.0,
            elevation_deg: 45.0,
        }
    }

    fn flat() -> ArcEphemeris {
        ArcEphemeris {
            epoch: t0(),
            peaks: vec![(t0() + Duration::seconds(300), 60.0)],
            half_width_s: 400.0,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn complete_triples_become_passes() {
        let events = vec![
            event(EventKind::Rise, 100),
            event(EventKind::Culminate, 300),
            event(EventKind::Set, 500),
        ];
        let passes = PassAssembler::default()
            .assemble(&flat(), &Observer::default(), "SAT", None, events, utc())
            .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.duration_seconds, 400);
        assert_eq!(pass.bearing_track.len(), DEFAULT_BEARING_RESOLUTION);
        assert_eq!(pass.bearing_track[0].timestamp, t0() + Duration::seconds(100));
        assert!(!pass.segments.is_empty());
    }

    #[test]
    fn leading_partial_pass_is_dropped() {
        let events = vec![
            event(EventKind::Culminate, 10),
            event(EventKind::Set, 60),
            event(EventKind::Rise, 100),
            event(EventKind::Culminate, 300),
            event(EventKind::Set, 500),
            event(EventKind::Rise, 900),
        ];
        let passes = PassAssembler::default()
            .assemble(&flat(), &Observer::default(), "SAT", None, events, utc())
            .unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].rise_time, t0() + Duration::seconds(100));
    }

    #[test]
    fn double_rise_is_malformed() {
        let events = vec![
            event(EventKind::Rise, 100),
            event(EventKind::Rise, 200),
            event(EventKind::Set, 500),
        ];
        let result =
            PassAssembler::default().assemble(&flat(), &Observer::default(), "SAT", None, events, utc());
        assert!(matches!(
            result,
            Err(PredictError::MalformedEventSequence(_))
        ));
    }

    #[test]
    fn stray_culmination_after_a_pass_is_malformed() {
        let events = vec![
            event(EventKind::Rise, 100),
            event(EventKind::Culminate, 300),
            event(EventKind::Set, 500),
            event(EventKind::Culminate, 600),
        ];
        let result =
            PassAssembler::default().assemble(&flat(), &Observer::default(), "SAT", None, events, utc());
        assert!(matches!(
            result,
            Err(PredictError::MalformedEventSequence(_))
        ));
    }

    #[test]
    fn times_are_reported_in_observer_local_offset() {
        let passes = PassPredictor::default()
            .predict(
                &flat(),
                "SAT",
                Some(1),
                &Observer::default(),
                10.0,
                t0() - Duration::hours(1),
                t0() + Duration::hours(1),
                2.0,
            )
            .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.rise_time.offset().local_minus_utc(), 7_200);
        assert!(pass.rise_time < pass.culminate_time && pass.culminate_time < pass.set_time);

        // culmination dominates every sampled bearing
        let peak = flat().elevation(pass.culminate_time.with_timezone(&Utc));
        for point in &pass.bearing_track {
            assert!(peak + 1e-6 >= point.elevation_deg);
        }
    }

    #[test]
    fn noaa_18_passes_over_gdansk() {
        let elements = sgp4::Elements::from_tle(
            Some("NOAA 18".to_string()),
            b"1 28654U 05018A   21161.43383936  .00000070  00000-0  62101-4 0  9990",
            b"2 28654  98.9940 226.2702 0013244 304.1597  55.8318 14.12612725827547",
        )
        .unwrap();
        let noaa = Sgp4Ephemeris::from_elements(elements).unwrap();
        let observer = Observer::new(18.5627, 54.4080);
        let start = noaa.epoch();

        let passes = PassPredictor::default()
            .predict(
                &noaa,
                "NOAA 18",
                Some(noaa.norad_id()),
                &observer,
                45.0,
                start,
                start + Duration::hours(72),
                2.0,
            )
            .unwrap();

        assert!(!passes.is_empty());
        for pass in &passes {
            assert!(pass.max_elevation_deg >= 45.0);
            assert!(pass.rise_time < pass.culminate_time);
            assert!(pass.culminate_time < pass.set_time);
        }
        assert!(passes.iter().any(|pass| {
            let minutes = (pass.set_time - pass.rise_time).num_seconds() as f64 / 60.0;
            (2.0..=12.0).contains(&minutes)
        }));
    }
}
