use std::f64::consts::{PI, TAU};

use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::{BearingPoint, GeoPoint};

/// A point in plot space: `(lon, lat)` for maps, `(theta, radius)` for polar plots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

impl PlotPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub fn map_points(track: &[GeoPoint]) -> Vec<PlotPoint> {
    track
        .iter()
        .map(|p| PlotPoint::new(p.longitude_deg, p.latitude_deg))
        .collect()
}

/// Polar projection: `theta` is the azimuth in radians in `[0, 2π)`, the radius is the
/// zenith distance `90 - elevation`, clamped at the horizon.
pub fn polar_points(track: &[BearingPoint]) -> Vec<PlotPoint> {
    track
        .iter()
        .map(|p| {
            PlotPoint::new(
                p.azimuth_deg.to_radians().rem_euclid(TAU),
                90.0 - p.elevation_deg.max(0.0),
            )
        })
        .collect()
}

/// The coordinate wrap a track is split at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seam {
    /// ±180° longitude on a lon/lat map.
    Antimeridian,
    /// North (0 / 2π) on a polar azimuth plot.
    Azimuth,
}

/// Seam values pinned to the two runs either side of a cut.
#[derive(Debug, Clone, Copy)]
struct Wrap {
    /// x appended to the run that ends at the cut.
    trailing: f64,
    /// x prepended to the run that starts after it.
    leading: f64,
}

impl Seam {
    /// The wrap between two consecutive samples, if any.
    ///
    /// A map track is cut where the longitude goes from negative to positive. A polar
    /// track is cut where the azimuth jumps by more than half a turn, which only
    /// happens through north; the direction of the jump picks which edge each side
    /// is pinned to.
    fn wrap(self, a: &PlotPoint, b: &PlotPoint) -> Option<Wrap> {
        match self {
            Seam::Antimeridian => (a.x < 0.0 && b.x > 0.0).then_some(Wrap {
                trailing: -180.0,
                leading: 180.0,
            }),
            Seam::Azimuth => {
                let delta = b.x - a.x;
                if delta < -PI {
                    Some(Wrap {
                        trailing: TAU,
                        leading: 0.0,
                    })
                } else if delta > PI {
                    Some(Wrap {
                        trailing: 0.0,
                        leading: TAU,
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// One drawable run of a track.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Segment {
    pub points: Vec<PlotPoint>,
    pub opacity: f64,
    /// `points[0]` is an inserted seam point.
    pub leading_boundary: bool,
    /// The last point is an inserted seam point.
    pub trailing_boundary: bool,
}

impl Segment {
    /// The track samples of this run, without inserted seam points.
    pub fn original_points(&self) -> &[PlotPoint] {
        let start = usize::from(self.leading_boundary);
        let end = self.points.len() - usize::from(self.trailing_boundary);
        &self.points[start..end]
    }
}

/// Splits tracks at a [`Seam`] into runs that can be drawn as plain polylines.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    seam: Seam,
}

impl Segmenter {
    pub fn new(seam: Seam) -> Self {
        Self { seam }
    }

    /// Runs partition the track in order. Every run except the first gets a leading
    /// seam point and every run except the last a trailing one, provided it holds more
    /// than two samples and does not already lie on the seam. Run `k` of `n` is drawn
    /// with opacity `(n - k) / n`.
    pub fn split(&self, track: &[PlotPoint]) -> Vec<Segment> {
        if track.is_empty() {
            return Vec::new();
        }

        let mut bounds = Vec::new();
        let mut wraps = Vec::new();
        let mut start = 0;
        for (i, pair) in track.windows(2).enumerate() {
            if let Some(wrap) = self.seam.wrap(&pair[0], &pair[1]) {
                bounds.push(start..i + 1);
                wraps.push(wrap);
                start = i + 1;
            }
        }
        bounds.push(start..track.len());

        let total = bounds.len();
        bounds
            .into_iter()
            .enumerate()
            .map(|(k, range)| {
                let run = &track[range];
                let mut points = Vec::with_capacity(run.len() + 2);
                let mut leading_boundary = false;
                let mut trailing_boundary = false;

                if run.len() > 2 && k > 0 {
                    let x = wraps[k - 1].leading;
                    if x != run[0].x {
                        points.push(PlotPoint::new(x, run[0].y));
                        leading_boundary = true;
                    }
                }
                points.extend_from_slice(run);
                if run.len() > 2 && k + 1 < total {
                    let last = &run[run.len() - 1];
                    let x = wraps[k].trailing;
                    if x != last.x {
                        points.push(PlotPoint::new(x, last.y));
                        trailing_boundary = true;
                    }
                }

                Segment {
                    points,
                    opacity: (total - k) as f64 / total as f64,
                    leading_boundary,
                    trailing_boundary,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(xs: &[f64]) -> Vec<PlotPoint> {
        xs.iter()
            .enumerate()
            .map(|(i, &x)| PlotPoint::new(x, i as f64))
            .collect()
    }

    fn rejoin(segments: &[Segment]) -> Vec<PlotPoint> {
        segments
            .iter()
            .flat_map(|s| s.original_points().iter().copied())
            .collect()
    }

    #[test]
    fn single_crossing_yields_two_runs() {
        let track = line(&[-3.0, -2.0, -1.0, 1.0, 2.0, 3.0]);
        let segments = Segmenter::new(Seam::Antimeridian).split(&track);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points.last(), Some(&PlotPoint::new(-180.0, 2.0)));
        assert_eq!(segments[1].points[0], PlotPoint::new(180.0, 3.0));
        assert_eq!(rejoin(&segments), track);
    }

    #[test]
    fn westward_ground_track_wraps_at_the_antimeridian() {
        let track = line(&[-170.0, -175.0, -179.0, 179.0, 175.0, 170.0, 160.0]);
        let segments = Segmenter::new(Seam::Antimeridian).split(&track);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].original_points().len(), 3);
        assert_eq!(segments[1].original_points().len(), 4);
    }

    #[test]
    fn track_without_wrap_is_one_opaque_run() {
        let track = line(&[10.0, 20.0, 30.0, 40.0]);
        let segments = Segmenter::new(Seam::Antimeridian).split(&track);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].opacity, 1.0);
        assert_eq!(segments[0].points, track);
    }

    #[test]
    fn opacity_strictly_decreases() {
        let track = line(&[-5.0, 5.0, -5.0, 5.0, -5.0, 5.0, -5.0, 5.0]);
        let segments = Segmenter::new(Seam::Antimeridian).split(&track);
        assert_eq!(segments.len(), 5);
        assert!(segments.windows(2).all(|w| w[0].opacity > w[1].opacity));
        assert!(segments.iter().all(|s| s.opacity > 0.0 && s.opacity <= 1.0));
        assert_eq!(rejoin(&segments), track);
    }

    #[test]
    fn short_runs_get_no_boundary_points() {
        let track = line(&[-2.0, -1.0, 1.0, 2.0]);
        let segments = Segmenter::new(Seam::Antimeridian).split(&track);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| !s.leading_boundary && !s.trailing_boundary));
    }

    #[test]
    fn run_already_on_the_seam_is_not_padded() {
        let track = line(&[-170.0, -175.0, -180.0, 180.0, 175.0, 170.0]);
        let segments = Segmenter::new(Seam::Antimeridian).split(&track);
        assert_eq!(segments.len(), 2);
        assert!(!segments[0].trailing_boundary);
        assert!(!segments[1].leading_boundary);
    }

    fn polar(azimuths: &[f64]) -> Vec<PlotPoint> {
        let bearings: Vec<BearingPoint> = azimuths
            .iter()
            .enumerate()
            .map(|(i, &azimuth_deg)| BearingPoint {
                timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH + chrono::Duration::seconds(i as i64),
                azimuth_deg,
                elevation_deg: 30.0,
            })
            .collect();
        polar_points(&bearings)
    }

    #[test]
    fn polar_track_wraps_through_north() {
        let track = polar(&[340.0, 350.0, 355.0, 5.0, 10.0, 20.0]);
        assert!(track.iter().all(|p| (0.0..TAU).contains(&p.x) && p.y == 60.0));

        let segments = Segmenter::new(Seam::Azimuth).split(&track);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points.last().map(|p| p.x), Some(TAU));
        assert_eq!(segments[1].points[0].x, 0.0);
        assert_eq!(rejoin(&segments), track);
    }

    #[test]
    fn counterclockwise_polar_track_wraps_through_north() {
        let track = polar(&[30.0, 20.0, 5.0, 355.0, 340.0, 330.0]);
        let segments = Segmenter::new(Seam::Azimuth).split(&track);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points.last().map(|p| p.x), Some(0.0));
        assert_eq!(segments[1].points[0].x, TAU);
        assert_eq!(rejoin(&segments), track);
    }

    #[test]
    fn polar_track_through_south_is_not_cut() {
        for azimuths in [
            [220.0, 200.0, 190.0, 170.0, 160.0, 140.0],
            [140.0, 160.0, 170.0, 190.0, 200.0, 220.0],
        ] {
            let track = polar(&azimuths);
            let segments = Segmenter::new(Seam::Azimuth).split(&track);
            assert_eq!(segments.len(), 1);
            assert_eq!(segments[0].points, track);
        }
    }

    #[test]
    fn below_horizon_samples_sit_on_the_rim() {
        let bearing = BearingPoint {
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            azimuth_deg: -90.0,
            elevation_deg: -4.0,
        };
        let p = polar_points(&[bearing])[0];
        assert_eq!(p.y, 90.0);
        assert!((p.x - 1.5 * PI).abs() < 1e-12);
    }
}
