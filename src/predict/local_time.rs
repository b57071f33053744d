use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::predict::error::PredictError;
use crate::predict::observer::Observer;

/// Resolves the UTC offset (in hours) to apply to times reported for an observer.
pub trait LocalTimeResolver: Send + Sync {
    fn offset_hours(&self, observer: &Observer) -> Result<f64, PredictError>;
}

/// Offset of a named IANA zone, evaluated at the current instant.
pub struct ZoneResolver {
    zone: Tz,
}

impl ZoneResolver {
    pub fn new(name: &str) -> Result<Self, PredictError> {
        let zone: Tz = name
            .parse()
            .map_err(|_| PredictError::TimezoneLookupFailed(format!("unknown zone '{name}'")))?;
        Ok(Self { zone })
    }

    fn offset_at(&self, at: DateTime<Utc>) -> f64 {
        let offset = self.zone.offset_from_utc_datetime(&at.naive_utc()).fix();
        offset.local_minus_utc() as f64 / 3600.0
    }
}

impl LocalTimeResolver for ZoneResolver {
    fn offset_hours(&self, _observer: &Observer) -> Result<f64, PredictError> {
        Ok(self.offset_at(Utc::now()))
    }
}

/// Nominal solar offset derived from the observer's longitude, `round(lon / 15)` hours.
pub struct SolarResolver;

impl LocalTimeResolver for SolarResolver {
    fn offset_hours(&self, observer: &Observer) -> Result<f64, PredictError> {
        let lon = observer.longitude_deg;
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(PredictError::TimezoneLookupFailed(format!(
                "longitude {lon} out of range"
            )));
        }
        Ok((lon / 15.0).round())
    }
}

pub struct FixedResolver(pub f64);

impl LocalTimeResolver for FixedResolver {
    fn offset_hours(&self, _observer: &Observer) -> Result<f64, PredictError> {
        Ok(self.0)
    }
}

pub fn fixed_offset(hours: f64) -> Result<FixedOffset, PredictError> {
    FixedOffset::east_opt((hours * 3600.0).round() as i32)
        .ok_or_else(|| PredictError::TimezoneLookupFailed(format!("offset {hours}h out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_resolver_follows_daylight_saving() {
        let warsaw = ZoneResolver::new("Europe/Warsaw").unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(warsaw.offset_at(winter), 1.0);
        assert_eq!(warsaw.offset_at(summer), 2.0);
    }

    #[test]
    fn unknown_zone_fails_lookup() {
        assert!(matches!(
            ZoneResolver::new("Mars/Olympus_Mons"),
            Err(PredictError::TimezoneLookupFailed(_))
        ));
    }

    #[test]
    fn solar_offset_rounds_longitude() {
        let gdansk = Observer::new(18.5627, 54.4080);
        assert_eq!(SolarResolver.offset_hours(&gdansk).unwrap(), 1.0);
        let honolulu = Observer::new(-157.86, 21.31);
        assert_eq!(SolarResolver.offset_hours(&honolulu).unwrap(), -11.0);
    }

    #[test]
    fn fractional_offsets_are_kept() {
        let offset = fixed_offset(5.5).unwrap();
        assert_eq!(offset.local_minus_utc(), 19_800);
        assert!(fixed_offset(30.0).is_err());
    }
}
