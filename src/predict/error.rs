use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid window: {0}")]
    InvalidWindow(String),
    #[error("invalid resolution {0}, at least 2 samples are required")]
    InvalidResolution(usize),
    #[error("malformed event sequence: {0}")]
    MalformedEventSequence(String),
    #[error("timezone lookup failed: {0}")]
    TimezoneLookupFailed(String),
    #[error("ephemeris unavailable: {0}")]
    EphemerisUnavailable(String),
}

impl PredictError {
    pub fn empty_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        PredictError::InvalidWindow(format!("start {start} is not before end {end}"))
    }
}

/// `[now - before, now + after]`, or `InvalidWindow` when either end leaves the
/// representable time range or the window is empty.
pub fn window_around(
    now: DateTime<Utc>,
    before_seconds: i64,
    after_seconds: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), PredictError> {
    let shift = |seconds: i64| {
        TimeDelta::try_seconds(seconds)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| {
                PredictError::InvalidWindow(format!("{seconds} s from {now} is out of range"))
            })
    };
    let start = shift(before_seconds.checked_neg().unwrap_or(i64::MAX))?;
    let end = shift(after_seconds)?;
    if start >= end {
        return Err(PredictError::empty_window(start, end));
    }
    Ok((start, end))
}

/// `[start, start + hours]`, rejecting non-finite, non-positive and unrepresentable spans.
pub fn window_ahead(
    start: DateTime<Utc>,
    hours: f64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), PredictError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(PredictError::InvalidWindow(format!(
            "window of {hours} hours must be positive"
        )));
    }
    // saturates at i64::MAX, which window_around then rejects
    window_around(start, 0, (hours * 3600.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_around_rejects_overflow_and_empty_windows() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let (start, end) = window_around(now, 60, 3600).unwrap();
        assert_eq!(start, now - TimeDelta::seconds(60));
        assert_eq!(end, now + TimeDelta::seconds(3600));

        for (before, after) in [(0, i64::MAX), (i64::MAX, 10), (i64::MIN, 10), (0, 0), (-20, 10)] {
            assert!(matches!(
                window_around(now, before, after),
                Err(PredictError::InvalidWindow(_))
            ));
        }
    }

    #[test]
    fn window_ahead_needs_a_positive_representable_span() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            window_ahead(now, 72.0).unwrap(),
            (now, now + TimeDelta::hours(72))
        );
        for hours in [0.0, -1.0, 1e-6, 1e300, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                window_ahead(now, hours),
                Err(PredictError::InvalidWindow(_))
            ));
        }
    }
}
