//! Home safe zone: a circle around the user's home location.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

/// Circle of `radius_m` meters around `home`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeZone {
    pub home: GpsPoint,
    pub radius_m: f64,
}

/// Where a location falls relative to the safe zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SafeZoneStatus {
    Inside { distance_m: f64 },
    Outside { distance_m: f64 },
}

impl SafeZoneStatus {
    pub fn is_outside(&self) -> bool {
        matches!(self, SafeZoneStatus::Outside { .. })
    }

    /// Distance from home in meters.
    pub fn distance_m(&self) -> f64 {
        match *self {
            SafeZoneStatus::Inside { distance_m } | SafeZoneStatus::Outside { distance_m } => {
                distance_m
            }
        }
    }
}

impl SafeZone {
    pub fn new(home: GpsPoint, radius_m: f64) -> Self {
        Self { home, radius_m }
    }

    pub fn distance_from_home(&self, point: &GpsPoint) -> f64 {
        haversine_distance(&self.home, point)
    }

    /// Classify `point`; the boundary itself counts as inside.
    pub fn status(&self, point: &GpsPoint) -> SafeZoneStatus {
        let distance_m = self.distance_from_home(point);
        if distance_m > self.radius_m {
            SafeZoneStatus::Outside { distance_m }
        } else {
            SafeZoneStatus::Inside { distance_m }
        }
    }

    pub fn contains(&self, point: &GpsPoint) -> bool {
        !self.status(point).is_outside()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::METERS_PER_DEGREE;

    #[test]
    fn test_inside_and_outside() {
        let zone = SafeZone::new(GpsPoint::new(0.0, 0.0), 500.0);

        let near = GpsPoint::new(400.0 / METERS_PER_DEGREE, 0.0);
        let far = GpsPoint::new(600.0 / METERS_PER_DEGREE, 0.0);

        assert!(zone.contains(&near));
        assert!(!zone.contains(&far));
        let status = zone.status(&far);
        assert!(status.is_outside());
        assert!((status.distance_m() - 600.0).abs() < 0.01);
    }

    #[test]
    fn test_boundary_is_inside() {
        let home = GpsPoint::new(0.0, 0.0);
        let edge = GpsPoint::new(0.0, 0.003);
        let zone = SafeZone::new(home, haversine_distance(&home, &edge));
        assert!(zone.contains(&edge));
    }
}
