//! # Landmark Nav
//!
//! Landmark memory and landmark-aware walking directions for people who need
//! help finding their way around familiar places.
//!
//! This library provides:
//! - A durable landmark store over a pluggable key-value collaborator
//! - Proximity detection that recognizes stored landmarks and records visits
//! - Cluster analysis that proposes new landmarks from a rolling location window
//! - Spoken-style directions that mention nearby landmarks
//!
//! ## Features
//!
//! - **`persistence`** (default) - SQLite-backed key-value storage
//! - **`parallel`** - Parallel duplicate checks in cluster analysis with rayon
//! - **`ffi`** - FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use landmark_nav::{GpsPoint, LandmarkConfig, LandmarkDraft, LandmarkStore, NavigationAnnouncer};
//!
//! let store = Arc::new(LandmarkStore::in_memory());
//! store
//!     .add(LandmarkDraft::new(0.000135, 0.0).with_name("the bakery"))
//!     .unwrap();
//!
//! let announcer = NavigationAnnouncer::new(store, LandmarkConfig::default());
//! let text = announcer.announce(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(0.001, 0.0));
//! assert_eq!(
//!     text,
//!     "You are near the bakery. Head north for approximately 111 meters."
//! );
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{LandmarkError, Result};

// Geographic utilities (distance, bearing, compass direction)
pub mod geo_utils;
pub use geo_utils::{
    bearing_degrees, compass_direction, distance_meters, haversine_distance, initial_bearing,
    CompassDirection,
};

// Landmark records and partial updates
pub mod landmark;
pub use landmark::{Landmark, LandmarkDraft, LandmarkPatch};

// Key-value persistence collaborators
pub mod kv;
pub use kv::{KeyValueStore, MemoryKv};

#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::SqliteKv;

// Landmark collection with serialized read-modify-write
pub mod store;
pub use store::{LandmarkStore, StoreHealth, StoreSnapshot};

// First-match and nearest-match landmark lookup, visit recording
pub mod proximity;
pub use proximity::{Detection, ProximityDetector};

// Fixed-radius clustering of the location window
pub mod clustering;
pub use clustering::{find_location_clusters, Cluster, ClusterAnalyzer};

// Landmark-aware spoken directions
pub mod navigation;
pub use navigation::{Instruction, LandmarkMention, NavigationAnnouncer};

// Rolling location window
pub mod history;
pub use history::LocationHistory;

// Home safe zone
pub mod safe_zone;
pub use safe_zone::{SafeZone, SafeZoneStatus};

// Stateful facade wiring all components to one store
pub mod engine;
pub use engine::{LandmarkEngine, LocationUpdate};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("LandmarkNavRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// Location samples fed by the host are plain `GpsPoint`s in chronological
/// order.
///
/// # Example
/// ```
/// use landmark_nav::GpsPoint;
/// let point = GpsPoint::new(12.9716, 77.5946); // Bengaluru
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Configuration shared by detection, clustering and announcements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LandmarkConfig {
    /// Radius that counts as "at" a landmark, also the cluster linkage radius.
    /// Default: 20.0 meters
    pub detection_radius_m: f64,

    /// Samples required in the window before clustering is attempted.
    /// Default: 10
    pub min_history_samples: u32,

    /// Clusters with fewer members are treated as noise.
    /// Default: 3
    pub min_cluster_size: u32,

    /// Nearest landmark within this distance is mentioned in directions.
    /// Default: 50.0 meters
    pub mention_radius_m: f64,

    /// Distance to the target below which directions report arrival.
    /// Default: 20.0 meters
    pub arrival_radius_m: f64,

    /// Capacity of the rolling location window.
    /// Default: 50
    pub history_capacity: u32,

    /// Radius around home used when a safe zone is set without one.
    /// Default: 500.0 meters
    pub safe_zone_radius_m: f64,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            detection_radius_m: 20.0,
            min_history_samples: 10,
            min_cluster_size: 3,
            mention_radius_m: 50.0,
            arrival_radius_m: 20.0,
            history_capacity: 50,
            safe_zone_radius_m: 500.0,
        }
    }
}

impl LandmarkConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
