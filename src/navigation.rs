//! Spoken-style directions that reference nearby landmarks.

use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::geo_utils::{compass_direction, haversine_distance, initial_bearing, CompassDirection};
use crate::proximity::nearest_landmark;
use crate::{GpsPoint, LandmarkConfig, LandmarkStore};

/// Spoken when the target is within the arrival radius.
pub const ARRIVED_MESSAGE: &str = "You are very close to your destination.";

/// How a nearby landmark is worked into an instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LandmarkMention {
    /// The user is at the landmark: "You are near {name}. " prefix
    Near { name: String, distance_m: f64 },
    /// The landmark is close by: " {name} is to your {direction}." suffix
    Toward {
        name: String,
        distance_m: f64,
        direction: CompassDirection,
    },
}

/// A structured instruction and its spoken text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub text: String,
    pub distance_m: f64,
    pub direction: CompassDirection,
    pub arrived: bool,
    pub landmark: Option<LandmarkMention>,
}

/// Builds directions from the current location to a target.
pub struct NavigationAnnouncer {
    store: Arc<LandmarkStore>,
    arrival_radius_m: f64,
    near_radius_m: f64,
    mention_radius_m: f64,
}

impl NavigationAnnouncer {
    pub fn new(store: Arc<LandmarkStore>, config: LandmarkConfig) -> Self {
        let mut announcer = Self {
            store,
            arrival_radius_m: 0.0,
            near_radius_m: 0.0,
            mention_radius_m: 0.0,
        };
        announcer.set_config(&config);
        announcer
    }

    pub fn set_config(&mut self, config: &LandmarkConfig) {
        self.arrival_radius_m = config.arrival_radius_m;
        self.near_radius_m = config.detection_radius_m;
        self.mention_radius_m = config.mention_radius_m;
    }

    /// Instruction text for walking from `current` to `target`.
    pub fn announce(&self, current: &GpsPoint, target: &GpsPoint) -> String {
        self.instruction(current, target).text
    }

    /// Full instruction for walking from `current` to `target`.
    ///
    /// Within the arrival radius the fixed arrival message is returned and no
    /// landmark is mentioned. Otherwise the nearest stored landmark (full scan,
    /// not first match) is mentioned when within the mention radius.
    pub fn instruction(&self, current: &GpsPoint, target: &GpsPoint) -> Instruction {
        let distance_m = haversine_distance(current, target);
        let direction = compass_direction(initial_bearing(current, target));

        if distance_m < self.arrival_radius_m {
            return Instruction {
                text: ARRIVED_MESSAGE.to_string(),
                distance_m,
                direction,
                arrived: true,
                landmark: None,
            };
        }

        let base = format!(
            "Head {} for approximately {} meters.",
            direction,
            distance_m.round() as i64
        );

        let landmarks = self.store.list();
        let mention = nearest_landmark(&landmarks, current)
            .filter(|(_, d)| *d < self.mention_radius_m)
            .map(|(landmark, d)| {
                let name = landmark.spoken_name().to_string();
                if d < self.near_radius_m {
                    LandmarkMention::Near {
                        name,
                        distance_m: d,
                    }
                } else {
                    LandmarkMention::Toward {
                        name,
                        distance_m: d,
                        direction: compass_direction(initial_bearing(current, &landmark.point())),
                    }
                }
            });

        let text = match &mention {
            Some(LandmarkMention::Near { name, .. }) => format!("You are near {}. {}", name, base),
            Some(LandmarkMention::Toward {
                name, direction, ..
            }) => format!("{} {} is to your {}.", base, name, direction),
            None => base,
        };
        debug!("[NavigationAnnouncer] {}", text);

        Instruction {
            text,
            distance_m,
            direction,
            arrived: false,
            landmark: mention,
        }
    }
}
