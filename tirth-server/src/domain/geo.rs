//! Great-circle distance helpers.
//!
//! All distances are in kilometres on a spherical Earth of radius
//! [`EARTH_RADIUS_KM`]. Inputs are degrees and are not range-checked:
//! out-of-range values produce a defined but meaningless number.

use ::geo::{Closest, ClosestPoint, Coord, Line, Point};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Arithmetic midpoint of two coordinates.
    ///
    /// Good enough to place a display waypoint; it is not the great-circle
    /// midpoint.
    pub fn midpoint(self, other: Coordinate) -> Coordinate {
        Coordinate {
            latitude: (self.latitude + other.latitude) / 2.0,
            longitude: (self.longitude + other.longitude) / 2.0,
        }
    }

    /// Haversine distance to another coordinate in kilometres.
    pub fn distance_km(self, other: Coordinate) -> f64 {
        distance_km(self, other)
    }
}

/// Haversine great-circle distance between two coordinates, in kilometres.
///
/// # Examples
///
/// ```
/// use tirth_server::domain::{Coordinate, distance_km};
///
/// let delhi = Coordinate::new(28.7041, 77.1025);
/// let jaipur = Coordinate::new(26.9124, 75.7873);
/// let d = distance_km(delhi, jaipur);
/// assert!(d > 230.0 && d < 290.0);
/// assert_eq!(distance_km(delhi, delhi), 0.0);
/// ```
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance from `point` to the straight segment `start`–`end`, in kilometres.
///
/// The segment is flattened onto an equirectangular plane centred on its mean
/// latitude, the closest point is found there and then measured back on the
/// sphere. Accurate for segments of a few hundred kilometres; segments that
/// cross the antimeridian are not handled.
pub fn distance_to_segment_km(point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
    if start == end {
        return distance_km(point, start);
    }

    let plane = LocalPlane::centred_on(start, end);
    let line = Line::new(plane.project(start), plane.project(end));
    let target = Point::from(plane.project(point));

    match line.closest_point(&target) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => {
            distance_km(point, plane.unproject(p.into()))
        }
        Closest::Indeterminate => distance_km(point, start).min(distance_km(point, end)),
    }
}

/// Equirectangular projection in kilometres around a reference latitude.
struct LocalPlane {
    cos_lat: f64,
}

impl LocalPlane {
    fn centred_on(a: Coordinate, b: Coordinate) -> Self {
        let mean_lat = ((a.latitude + b.latitude) / 2.0).to_radians();
        Self {
            cos_lat: mean_lat.cos().max(f64::EPSILON),
        }
    }

    fn project(&self, c: Coordinate) -> Coord<f64> {
        Coord {
            x: c.longitude.to_radians() * self.cos_lat * EARTH_RADIUS_KM,
            y: c.latitude.to_radians() * EARTH_RADIUS_KM,
        }
    }

    fn unproject(&self, c: Coord<f64>) -> Coordinate {
        Coordinate {
            latitude: (c.y / EARTH_RADIUS_KM).to_degrees(),
            longitude: (c.x / (EARTH_RADIUS_KM * self.cos_lat)).to_degrees(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::east_of;
    use super::*;

    fn delhi() -> Coordinate {
        Coordinate::new(28.7041, 77.1025)
    }

    fn jaipur() -> Coordinate {
        Coordinate::new(26.9124, 75.7873)
    }

    #[test]
    fn identical_points_are_zero() {
        assert_eq!(distance_km(delhi(), delhi()), 0.0);
    }

    #[test]
    fn delhi_to_jaipur_is_plausible() {
        let d = distance_km(delhi(), jaipur());
        // Haversine gives ~237.5 km for these coordinates.
        assert!((230.0..=290.0).contains(&d), "got {d}");
    }

    #[test]
    fn antipodal_is_half_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((distance_km(a, b) - half).abs() < 1e-6);
    }

    #[test]
    fn midpoint_is_mean() {
        let m = Coordinate::new(10.0, 20.0).midpoint(Coordinate::new(20.0, 40.0));
        assert_eq!(m, Coordinate::new(15.0, 30.0));
    }

    #[test]
    fn east_offset_helper_is_accurate() {
        let base = Coordinate::new(26.0, 75.0);
        let d = distance_km(base, east_of(base, 4.0));
        assert!((d - 4.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn segment_distance_perpendicular_to_middle() {
        let start = Coordinate::new(25.0, 75.0);
        let end = Coordinate::new(27.0, 75.0);
        let mid = start.midpoint(end);

        let d = distance_to_segment_km(east_of(mid, 4.0), start, end);
        assert!((d - 4.0).abs() < 0.01, "got {d}");

        let d = distance_to_segment_km(east_of(mid, 6.0), start, end);
        assert!((d - 6.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn segment_distance_on_the_line_is_zero() {
        let start = Coordinate::new(25.0, 75.0);
        let end = Coordinate::new(27.0, 75.0);
        let on_line = Coordinate::new(25.5, 75.0);
        assert!(distance_to_segment_km(on_line, start, end) < 1e-6);
    }

    #[test]
    fn segment_distance_beyond_end_uses_endpoint() {
        let start = Coordinate::new(25.0, 75.0);
        let end = Coordinate::new(27.0, 75.0);
        let beyond = Coordinate::new(28.0, 75.0);
        let expected = distance_km(beyond, end);
        assert!((distance_to_segment_km(beyond, start, end) - expected).abs() < 1e-6);
    }

    #[test]
    fn degenerate_segment_is_point_distance() {
        let d = distance_to_segment_km(jaipur(), delhi(), delhi());
        assert_eq!(d, distance_km(jaipur(), delhi()));
    }
}
