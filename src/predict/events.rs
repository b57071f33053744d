use chrono::{DateTime, Duration, Utc};

use crate::predict::ephemeris::EphemerisPort;
use crate::predict::error::PredictError;
use crate::predict::observer::Observer;
use crate::predict::types::{Event, EventKind, Topocentric};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for crossing refinement
const CULMINATION_STEP_MILLIS: i64 = 10;

const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Scans an observation window for rise, culmination and set events.
#[derive(Debug, Clone)]
pub struct PassEventDetector {
    pub coarse_step: Duration,
    pub crossing_tolerance: Duration,
    pub culmination_tolerance: Duration,
}

impl Default for PassEventDetector {
    fn default() -> Self {
        Self {
            coarse_step: Duration::seconds(COARSE_STEP_SECONDS),
            crossing_tolerance: Duration::seconds(FINE_STEP_SECONDS),
            culmination_tolerance: Duration::milliseconds(CULMINATION_STEP_MILLIS),
        }
    }
}

/// Satellite above the threshold, as seen so far by the coarse scan.
struct Encounter {
    /// Refined rise time, or the window start when the window opened mid-pass.
    since: DateTime<Utc>,
    peak: Topocentric,
}

impl PassEventDetector {
    /// Emits strictly time-ordered events for every threshold crossing in `[start, end]`.
    ///
    /// An encounter already in progress at `start` yields no Rise, only its Culminate
    /// (when the maximum lies inside the window) and its Set.
    pub fn detect(
        &self,
        ephemeris: &dyn EphemerisPort,
        observer: &Observer,
        min_elevation_deg: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, PredictError> {
        if start >= end {
            return Err(PredictError::empty_window(start, end));
        }

        let mut events = Vec::new();
        let mut cursor = start;
        let mut prev: Option<Topocentric> = None;
        let mut encounter: Option<Encounter> = None;

        loop {
            let sample = ephemeris.topocentric(observer, cursor)?;
            let visible = sample.elevation_deg >= min_elevation_deg;
            let was_visible = prev.map(|p| p.elevation_deg >= min_elevation_deg);

            match (was_visible, visible) {
                (None, true) => {
                    encounter = Some(Encounter {
                        since: start,
                        peak: sample,
                    });
                }
                (Some(false), true) => {
                    let before = prev.map(|p| p.timestamp).unwrap_or(start);
                    let rise = self.refine_crossing(
                        ephemeris,
                        observer,
                        min_elevation_deg,
                        before,
                        cursor,
                        true,
                    )?;
                    events.push(event(EventKind::Rise, &rise));
                    encounter = Some(Encounter {
                        since: rise.timestamp,
                        peak: sample,
                    });
                }
                (Some(true), true) => {
                    if let Some(enc) = encounter.as_mut() {
                        if sample.elevation_deg > enc.peak.elevation_deg {
                            enc.peak = sample;
                        }
                    }
                }
                (Some(true), false) => {
                    if let Some(enc) = encounter.take() {
                        let before = prev.map(|p| p.timestamp).unwrap_or(start);
                        let set = self.refine_crossing(
                            ephemeris,
                            observer,
                            min_elevation_deg,
                            before,
                            cursor,
                            false,
                        )?;
                        if let Some(culmination) =
                            self.culmination(ephemeris, observer, &enc, start, set.timestamp)?
                        {
                            events.push(event(EventKind::Culminate, &culmination));
                        }
                        events.push(event(EventKind::Set, &set));
                    }
                }
                _ => {}
            }

            prev = Some(sample);
            if cursor >= end {
                break;
            }
            cursor = (cursor + self.coarse_step).min(end);
        }

        // Pass still in progress when the window closes
        if let Some(enc) = encounter {
            if enc.peak.timestamp < end {
                if let Some(culmination) =
                    self.culmination(ephemeris, observer, &enc, start, end)?
                {
                    events.push(event(EventKind::Culminate, &culmination));
                }
            }
        }

        Ok(events)
    }

    /// Binary search for the threshold crossing between two coarse samples.
    fn refine_crossing(
        &self,
        ephemeris: &dyn EphemerisPort,
        observer: &Observer,
        min_elevation_deg: f64,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        rising: bool,
    ) -> Result<Topocentric, PredictError> {
        let mut low = before;
        let mut high = after;

        while high - low > self.crossing_tolerance {
            let mid = low + (high - low) / 2;
            let sample = ephemeris.topocentric(observer, mid)?;

            let above = sample.elevation_deg >= min_elevation_deg;
            if above == rising {
                high = mid;
            } else {
                low = mid;
            }
        }

        ephemeris.topocentric(observer, high)
    }

    /// Golden-section search for the elevation maximum around the coarse peak.
    ///
    /// Returns `None` when the coarse peak sits on the window start, i.e. the maximum
    /// happened before the window opened.
    fn culmination(
        &self,
        ephemeris: &dyn EphemerisPort,
        observer: &Observer,
        enc: &Encounter,
        window_start: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Option<Topocentric>, PredictError> {
        if enc.peak.timestamp <= window_start && enc.since <= window_start {
            return Ok(None);
        }

        let lo = (enc.peak.timestamp - self.coarse_step).max(enc.since);
        let hi = (enc.peak.timestamp + self.coarse_step).min(until);
        if hi <= lo {
            return Ok(None);
        }

        let elevation_at = |offset: f64| -> Result<f64, PredictError> {
            Ok(ephemeris.topocentric(observer, at(lo, offset))?.elevation_deg)
        };

        let tolerance = self.culmination_tolerance.num_milliseconds().max(1) as f64 / 1000.0;
        let mut a = 0.0;
        let mut b = (hi - lo).num_milliseconds() as f64 / 1000.0;
        let mut c = b - INV_PHI * (b - a);
        let mut d = a + INV_PHI * (b - a);
        let mut fc = elevation_at(c)?;
        let mut fd = elevation_at(d)?;

        while b - a > tolerance {
            if fc > fd {
                b = d;
                d = c;
                fd = fc;
                c = b - INV_PHI * (b - a);
                fc = elevation_at(c)?;
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + INV_PHI * (b - a);
                fd = elevation_at(d)?;
            }
        }

        let best = ephemeris.topocentric(observer, at(lo, (a + b) / 2.0))?;
        Ok(Some(best))
    }
}

fn at(base: DateTime<Utc>, offset_seconds: f64) -> DateTime<Utc> {
    base + Duration::microseconds((offset_seconds * 1e6).round() as i64)
}

fn event(kind: EventKind, sample: &Topocentric) -> Event {
    Event {
        kind,
        time: sample.timestamp,
        azimuth_deg: sample.azimuth_deg,
        elevation_deg: sample.elevation_deg,
    }
}
