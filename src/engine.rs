//! # Landmark Engine
//!
//! Stateful facade the host application drives.
//!
//! ## Architecture
//!
//! The engine owns:
//! - One shared [`LandmarkStore`], injected into every component
//! - The rolling [`LocationHistory`] window
//! - An optional home [`SafeZone`]
//!
//! The host feeds each new location sample to [`LandmarkEngine::record_location`]
//! (detection plus safe-zone check), asks for suggestions less often with
//! [`LandmarkEngine::suggest_landmark`], and requests directions on demand.

use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;

use crate::error::Result;
use crate::{
    ClusterAnalyzer, Detection, GpsPoint, Landmark, LandmarkConfig, LandmarkDraft, LandmarkStore,
    LocationHistory, NavigationAnnouncer, ProximityDetector, SafeZone, SafeZoneStatus,
};

/// What happened when a location sample was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    /// Landmark recognized at this sample, with its visit recorded
    pub detection: Option<Detection>,
    /// Safe-zone classification, if a safe zone is set
    pub safe_zone: Option<SafeZoneStatus>,
    /// Why a recognized landmark's visit could not be saved
    pub detection_error: Option<String>,
}

/// The main stateful landmark engine.
pub struct LandmarkEngine {
    store: Arc<LandmarkStore>,
    detector: ProximityDetector,
    analyzer: ClusterAnalyzer,
    announcer: NavigationAnnouncer,
    history: LocationHistory,
    safe_zone: Option<SafeZone>,
    config: LandmarkConfig,
}

impl LandmarkEngine {
    /// Create an engine over `store` with default configuration.
    pub fn new(store: LandmarkStore) -> Self {
        Self::with_config(store, LandmarkConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(store: LandmarkStore, config: LandmarkConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create an engine around a store that other owners also hold.
    pub fn with_shared_store(store: Arc<LandmarkStore>, config: LandmarkConfig) -> Self {
        Self {
            detector: ProximityDetector::new(store.clone(), &config),
            analyzer: ClusterAnalyzer::new(store.clone(), config.clone()),
            announcer: NavigationAnnouncer::new(store.clone(), config.clone()),
            history: LocationHistory::new(config.history_capacity as usize),
            safe_zone: store.load_safe_zone(),
            store,
            config,
        }
    }

    /// Shared handle to the landmark store.
    pub fn store(&self) -> &Arc<LandmarkStore> {
        &self.store
    }

    // ========================================================================
    // Location Feed
    // ========================================================================

    /// Record a new location sample.
    ///
    /// Invalid samples are ignored entirely. Valid samples join the history
    /// window, are checked against stored landmarks (recording a visit on a
    /// match) and classified against the safe zone.
    ///
    /// The safe-zone status is always reported. A visit that cannot be saved
    /// leaves `detection` empty and sets `detection_error`.
    pub fn record_location(&mut self, sample: GpsPoint) -> LocationUpdate {
        if !sample.is_valid() {
            warn!(
                "[LandmarkEngine] Ignoring invalid sample ({}, {})",
                sample.latitude, sample.longitude
            );
            return LocationUpdate {
                detection: None,
                safe_zone: None,
                detection_error: None,
            };
        }

        self.history.push(sample);
        let safe_zone = self.safe_zone.map(|zone| zone.status(&sample));
        if let Some(status) = safe_zone.filter(SafeZoneStatus::is_outside) {
            info!(
                "[LandmarkEngine] Outside safe zone ({:.0}m from home)",
                status.distance_m()
            );
        }

        let (detection, detection_error) = match self.detector.detect(&sample) {
            Ok(detection) => (detection, None),
            Err(e) => {
                error!("[LandmarkEngine] Visit could not be recorded: {}", e);
                (None, Some(e.to_string()))
            }
        };
        LocationUpdate {
            detection,
            safe_zone,
            detection_error,
        }
    }

    /// Samples currently in the history window, oldest first.
    pub fn history(&mut self) -> &[GpsPoint] {
        self.history.window()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ========================================================================
    // Landmark Discovery
    // ========================================================================

    /// Suggest a new landmark from the current history window.
    pub fn suggest_landmark(&mut self) -> Option<LandmarkDraft> {
        let window = self.history.window();
        self.analyzer.detect_potential_landmark(window)
    }

    /// Store a suggestion the user accepted, with the name they gave it.
    pub fn confirm_suggestion(
        &self,
        draft: LandmarkDraft,
        name: &str,
        description: &str,
    ) -> Result<Landmark> {
        self.store.add(LandmarkDraft {
            name: name.to_string(),
            description: description.to_string(),
            suggested: false,
            ..draft
        })
    }

    // ========================================================================
    // Directions
    // ========================================================================

    /// Spoken directions from `current` to `target`.
    pub fn directions(&self, current: &GpsPoint, target: &GpsPoint) -> String {
        self.announcer.announce(current, target)
    }

    /// Spoken directions back home, if a safe zone is set.
    pub fn directions_home(&self, current: &GpsPoint) -> Option<String> {
        self.safe_zone
            .map(|zone| self.announcer.announce(current, &zone.home))
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Set and persist the safe zone; `None` radius uses the configured default.
    ///
    /// The zone takes effect immediately even if saving it fails; the error
    /// is returned so the host can retry.
    pub fn set_safe_zone(&mut self, home: GpsPoint, radius_m: Option<f64>) -> Result<()> {
        let radius_m = radius_m.unwrap_or(self.config.safe_zone_radius_m);
        info!(
            "[LandmarkEngine] Safe zone set: ({:.6}, {:.6}) r={:.0}m",
            home.latitude, home.longitude, radius_m
        );
        let zone = SafeZone::new(home, radius_m);
        self.safe_zone = Some(zone);
        self.store.save_safe_zone(Some(&zone))
    }

    /// Remove the safe zone, in memory and in storage.
    pub fn clear_safe_zone(&mut self) -> Result<()> {
        self.safe_zone = None;
        self.store.save_safe_zone(None)
    }

    pub fn safe_zone(&self) -> Option<&SafeZone> {
        self.safe_zone.as_ref()
    }

    /// Replace the configuration for every component.
    pub fn set_config(&mut self, config: LandmarkConfig) {
        self.detector.set_config(&config);
        self.analyzer.set_config(config.clone());
        self.announcer.set_config(&config);
        self.history.set_capacity(config.history_capacity as usize);
        self.config = config;
    }

    pub fn config(&self) -> &LandmarkConfig {
        &self.config
    }
}
