//! Landmark lookup strategies and visit detection.
//!
//! Two lookups are kept separate:
//! - [`first_within_radius`] walks landmarks in store order and stops at the
//!   first one inside the radius. This is what visit detection uses, so when
//!   landmarks overlap the earliest stored one wins even if another is closer.
//! - [`nearest_landmark`] scans everything and returns the true nearest. This
//!   is what spoken directions use.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::error::Result;
use crate::geo_utils::haversine_distance;
use crate::{GpsPoint, Landmark, LandmarkConfig, LandmarkStore};

/// First landmark in store order whose distance from `point` is at most
/// `radius_m`, with that distance.
pub fn first_within_radius<'a>(
    landmarks: &'a [Landmark],
    point: &GpsPoint,
    radius_m: f64,
) -> Option<(&'a Landmark, f64)> {
    landmarks.iter().find_map(|landmark| {
        let distance = haversine_distance(point, &landmark.point());
        (distance <= radius_m).then_some((landmark, distance))
    })
}

/// Landmark closest to `point`, with its distance. Ties keep the earlier one.
pub fn nearest_landmark<'a>(
    landmarks: &'a [Landmark],
    point: &GpsPoint,
) -> Option<(&'a Landmark, f64)> {
    let mut best: Option<(&Landmark, f64)> = None;
    for landmark in landmarks {
        let distance = haversine_distance(point, &landmark.point());
        let is_better = match best {
            Some((_, best_distance)) => distance < best_distance,
            None => true,
        };
        if is_better {
            best = Some((landmark, distance));
        }
    }
    best
}

/// Whether any landmark lies within `radius_m` of `point`. No side effects.
pub fn any_within_radius(landmarks: &[Landmark], point: &GpsPoint, radius_m: f64) -> bool {
    first_within_radius(landmarks, point, radius_m).is_some()
}

/// A recognized landmark and how far the user was from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// The landmark after its visit was recorded
    pub landmark: Landmark,
    pub distance_m: f64,
}

/// Recognizes stored landmarks at the current location and records visits.
pub struct ProximityDetector {
    store: Arc<LandmarkStore>,
    radius_m: f64,
}

impl ProximityDetector {
    pub fn new(store: Arc<LandmarkStore>, config: &LandmarkConfig) -> Self {
        Self {
            store,
            radius_m: config.detection_radius_m,
        }
    }

    pub fn set_config(&mut self, config: &LandmarkConfig) {
        self.radius_m = config.detection_radius_m;
    }

    /// Check the current location against stored landmarks.
    ///
    /// On a match the landmark's visit count is incremented and persisted;
    /// the returned landmark reflects the persisted state. Returns `Ok(None)`
    /// when nothing is within the detection radius. Persistence failures
    /// while recording the visit are returned as errors.
    pub fn detect(&self, location: &GpsPoint) -> Result<Option<Detection>> {
        let landmarks = self.store.list();
        let Some((matched, distance_m)) = first_within_radius(&landmarks, location, self.radius_m)
        else {
            return Ok(None);
        };

        match self.store.record_visit(&matched.id)? {
            Some(landmark) => {
                info!(
                    "[ProximityDetector] At landmark {} ({:.1}m), visit #{}",
                    landmark.id, distance_m, landmark.visit_count
                );
                Ok(Some(Detection {
                    landmark,
                    distance_m,
                }))
            }
            None => {
                // Removed between the scan and the visit update
                debug!(
                    "[ProximityDetector] Landmark {} vanished before visit was recorded",
                    matched.id
                );
                Ok(None)
            }
        }
    }

    /// Like [`detect`](Self::detect), invoking `on_detected` with the landmark
    /// and distance when one is recognized.
    pub fn detect_and_notify<F>(&self, location: &GpsPoint, on_detected: F) -> Result<Option<Detection>>
    where
        F: FnOnce(&Landmark, f64),
    {
        let detection = self.detect(location)?;
        if let Some(ref d) = detection {
            on_detected(&d.landmark, d.distance_m);
        }
        Ok(detection)
    }
}
