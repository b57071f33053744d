use chrono::{DateTime, Utc};
use geo::{Area, ConvexHull, MultiPoint, Point};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::{EphemerisPort, Observer};
use crate::track::error::TrackError;
use crate::track::segment::PlotPoint;

/// Closed `(lon, lat)` ring, the first vertex repeated as the last.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FootprintPolygon {
    pub vertices: Vec<PlotPoint>,
}

impl FootprintPolygon {
    /// Number of distinct vertices.
    pub fn corner_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FootprintBuilder;

impl FootprintBuilder {
    pub fn build(&self, points: &[PlotPoint]) -> Result<FootprintPolygon, TrackError> {
        if points.len() < 3 {
            return Err(TrackError::InsufficientPoints(points.len()));
        }

        let cloud: MultiPoint<f64> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
        let hull = cloud.convex_hull();
        if hull.unsigned_area() <= 0.0 {
            return Err(TrackError::DegenerateHull);
        }

        let mut vertices: Vec<PlotPoint> = hull
            .exterior()
            .coords()
            .map(|c| PlotPoint::new(c.x, c.y))
            .collect();
        if vertices.first() != vertices.last() {
            vertices.push(vertices[0]);
        }

        Ok(FootprintPolygon { vertices })
    }
}

/// Grid points, `1 / resolution` degrees apart, from which the satellite is above the
/// horizon at `t`.
pub fn visible_points(
    ephemeris: &dyn EphemerisPort,
    t: DateTime<Utc>,
    resolution: f64,
) -> Result<Vec<PlotPoint>, TrackError> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(TrackError::InvalidGridResolution(resolution));
    }

    let rows = (180.0 * resolution) as usize;
    let columns = (360.0 * resolution) as usize;
    let mut visible = Vec::new();

    for row in 0..rows {
        let latitude = row as f64 / resolution - 90.0;
        for column in 0..columns {
            let longitude = column as f64 / resolution - 180.0;
            let ground = Observer::new(longitude, latitude);
            if ephemeris.topocentric(&ground, t)?.elevation_deg > 0.0 {
                visible.push(PlotPoint::new(longitude, latitude));
            }
        }
    }

    log::debug!(
        "{} of {} grid points see the satellite",
        visible.len(),
        rows * columns
    );
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::{GeoPoint, PredictError, Topocentric};
    use chrono::TimeZone;

    fn disc(radius: f64, n: usize) -> Vec<PlotPoint> {
        let mut points = vec![PlotPoint::new(0.0, 0.0)];
        for i in 0..n {
            let a = i as f64 * std::f64::consts::TAU / n as f64;
            points.push(PlotPoint::new(radius * a.cos(), radius * a.sin()));
            points.push(PlotPoint::new(0.5 * radius * a.cos(), 0.5 * radius * a.sin()));
        }
        points
    }

    #[test]
    fn hull_of_a_disc_is_closed() {
        let polygon = FootprintBuilder.build(&disc(10.0, 16)).unwrap();
        assert!(polygon.vertices.len() >= 4);
        assert_eq!(polygon.vertices.first(), polygon.vertices.last());
        assert_eq!(polygon.corner_count(), 16);
        for v in &polygon.vertices {
            assert!(((v.x * v.x + v.y * v.y).sqrt() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn too_few_points() {
        let points = [PlotPoint::new(0.0, 0.0), PlotPoint::new(1.0, 1.0)];
        assert!(matches!(
            FootprintBuilder.build(&points),
            Err(TrackError::InsufficientPoints(2))
        ));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let points: Vec<PlotPoint> = (0..5).map(|i| PlotPoint::new(i as f64, 2.0 * i as f64)).collect();
        assert!(matches!(
            FootprintBuilder.build(&points),
            Err(TrackError::DegenerateHull)
        ));
    }

    /// Visible from every ground point within 20° of (0, 0).
    struct Overhead;

    impl EphemerisPort for Overhead {
        fn subpoint(&self, t: DateTime<Utc>) -> Result<GeoPoint, PredictError> {
            Ok(GeoPoint {
                timestamp: t,
                longitude_deg: 0.0,
                latitude_deg: 0.0,
                altitude_km: 800.0,
            })
        }

        fn topocentric(
            &self,
            observer: &Observer,
            t: DateTime<Utc>,
        ) -> Result<Topocentric, PredictError> {
            let distance = observer.longitude_deg.hypot(observer.latitude_deg);
            Ok(Topocentric {
                timestamp: t,
                azimuth_deg: 0.0,
                elevation_deg: 20.0 - distance,
                range_km: 1000.0,
                range_rate_km_s: 0.0,
            })
        }

        fn epoch(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        }
    }

    #[test]
    fn grid_scan_feeds_the_hull() {
        let t = Overhead.epoch();
        let points = visible_points(&Overhead, t, 0.5).unwrap();
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.x.hypot(p.y) < 20.0));
        // 2° grid
        assert!(points.contains(&PlotPoint::new(0.0, 0.0)));
        assert!(points.contains(&PlotPoint::new(-18.0, 0.0)));

        let polygon = FootprintBuilder.build(&points).unwrap();
        assert_eq!(polygon.vertices.first(), polygon.vertices.last());
    }

    #[test]
    fn grid_resolution_must_be_positive() {
        let t = Overhead.epoch();
        assert!(matches!(
            visible_points(&Overhead, t, 0.0),
            Err(TrackError::InvalidGridResolution(_))
        ));
    }
}
