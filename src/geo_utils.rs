//! Geographic utilities: great-circle distance, initial bearing and
//! compass direction.
//!
//! All inputs are WGS-84 degrees. Distances use a spherical Earth with a
//! 6371 km radius.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GpsPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Length of one degree of latitude in meters on the model sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Haversine distance in meters between two coordinates.
///
/// The haversine term is clamped to `[0, 1]` so rounding overshoot near
/// identical or antipodal points never produces NaN.
///
/// # Example
/// ```
/// use landmark_nav::geo_utils::distance_meters;
/// let d = distance_meters(0.0, 0.0, 1.0, 0.0);
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Haversine distance in meters between two GPS points.
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    distance_meters(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Initial great-circle bearing from point 1 to point 2, in `[0, 360)`.
pub fn bearing_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let y = d_lon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round a tiny negative angle up to exactly 360.0
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Initial bearing between two GPS points, in `[0, 360)`.
#[inline]
pub fn initial_bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    bearing_degrees(from.latitude, from.longitude, to.latitude, to.longitude)
}

/// One of the eight 45° compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum CompassDirection {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl CompassDirection {
    /// Sectors in clockwise order starting at north.
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::North,
        CompassDirection::Northeast,
        CompassDirection::East,
        CompassDirection::Southeast,
        CompassDirection::South,
        CompassDirection::Southwest,
        CompassDirection::West,
        CompassDirection::Northwest,
    ];

    /// Lowercase spoken form, e.g. `"northeast"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompassDirection::North => "north",
            CompassDirection::Northeast => "northeast",
            CompassDirection::East => "east",
            CompassDirection::Southeast => "southeast",
            CompassDirection::South => "south",
            CompassDirection::Southwest => "southwest",
            CompassDirection::West => "west",
            CompassDirection::Northwest => "northwest",
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a bearing in degrees to the sector centered nearest to it.
///
/// `round(bearing / 45) mod 8` selects the sector, so 337.5° and above wrap
/// back to north.
pub fn compass_direction(bearing: f64) -> CompassDirection {
    let sector = (bearing.rem_euclid(360.0) / 45.0).round() as usize % 8;
    CompassDirection::ALL[sector]
}

/// Convert a distance in meters to approximate (latitude, longitude) degree
/// spans at the given reference latitude.
///
/// The longitude span grows toward the poles and is capped at 360°.
pub fn meters_to_degrees(meters: f64, ref_lat: f64) -> (f64, f64) {
    let lat_deg = meters / METERS_PER_DEGREE;
    let cos_lat = ref_lat.to_radians().cos().abs();
    let lng_deg = if cos_lat < 1e-9 {
        360.0
    } else {
        (lat_deg / cos_lat).min(360.0)
    };
    (lat_deg, lng_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identical_points_is_zero() {
        for &(lat, lon) in &[(0.0, 0.0), (51.5074, -0.1278), (-89.9, 179.9), (12.9, 77.6)] {
            assert_eq!(distance_meters(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = (51.5074, -0.1278);
        let b = (48.8566, 2.3522);
        assert_eq!(
            distance_meters(a.0, a.1, b.0, b.1),
            distance_meters(b.0, b.1, a.0, a.1)
        );
    }

    #[test]
    fn test_one_degree_latitude_at_equator() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_320.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);

        let d = distance_meters(90.0, 0.0, -90.0, 0.0);
        assert!(d.is_finite());
    }

    #[test]
    fn test_bearing_cardinals() {
        assert!((bearing_degrees(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((bearing_degrees(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing_degrees(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing_degrees(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let points = [(0.0, 0.0), (10.0, 10.0), (-33.9, 151.2), (64.1, -21.9)];
        for a in &points {
            for b in &points {
                let bearing = bearing_degrees(a.0, a.1, b.0, b.1);
                assert!((0.0..360.0).contains(&bearing), "bearing {bearing}");
            }
        }
    }

    #[test]
    fn test_compass_direction() {
        assert_eq!(compass_direction(0.0), CompassDirection::North);
        assert_eq!(compass_direction(359.0), CompassDirection::North);
        assert_eq!(compass_direction(90.0), CompassDirection::East);
        assert_eq!(compass_direction(180.0), CompassDirection::South);
        assert_eq!(compass_direction(44.0), CompassDirection::Northeast);
        assert_eq!(compass_direction(22.4), CompassDirection::North);
        assert_eq!(compass_direction(292.5), CompassDirection::Northwest);
        assert_eq!(compass_direction(250.0), CompassDirection::West);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(CompassDirection::Southwest.to_string(), "southwest");
        assert_eq!(
            serde_json::to_string(&CompassDirection::Northeast).unwrap(),
            "\"northeast\""
        );
    }

    #[test]
    fn test_meters_to_degrees() {
        let (lat_deg, lng_deg) = meters_to_degrees(METERS_PER_DEGREE, 0.0);
        assert!((lat_deg - 1.0).abs() < 1e-12);
        assert!((lng_deg - 1.0).abs() < 1e-12);

        let (_, lng_deg) = meters_to_degrees(METERS_PER_DEGREE, 60.0);
        assert!((lng_deg - 2.0).abs() < 1e-9);

        let (_, lng_deg) = meters_to_degrees(20.0, 90.0);
        assert_eq!(lng_deg, 360.0);
    }
}
