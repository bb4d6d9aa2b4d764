//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the landmark engine
//! to Kotlin and Swift. A single process-wide engine backed by SQLite is
//! created by [`landmark_engine_init`]; every other call is a no-op (returning
//! an empty/`false` result) until then.
//!
//! Landmark records cross the boundary as JSON strings using the same
//! camelCase field names as the persisted collection.

use std::sync::Mutex;

use log::{error, info, warn};
use once_cell::sync::Lazy;

use crate::{
    bearing_degrees, compass_direction, distance_meters, init_logging, CompassDirection, GpsPoint,
    LandmarkConfig, LandmarkDraft, LandmarkEngine, LandmarkPatch, LandmarkStore, SqliteKv,
};

/// Global engine instance.
///
/// This singleton allows FFI calls to access a shared engine without
/// passing state back and forth across the FFI boundary.
pub static LANDMARK_ENGINE: Lazy<Mutex<Option<LandmarkEngine>>> = Lazy::new(|| Mutex::new(None));

/// Get a lock on the global engine.
pub fn with_landmark_engine<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut LandmarkEngine) -> R,
{
    let mut guard = LANDMARK_ENGINE.lock().ok()?;
    guard.as_mut().map(f)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error!("[LandmarkFFI] Failed to serialize result: {}", e);
        "null".to_string()
    })
}

// ============================================================================
// Engine Lifecycle
// ============================================================================

/// Initialize the engine with a database path.
/// Call this once at app startup before any other engine functions.
#[uniffi::export]
pub fn landmark_engine_init(db_path: String, config: Option<LandmarkConfig>) -> bool {
    init_logging();
    info!("[LandmarkFFI] Initializing with db: {}", db_path);

    match SqliteKv::new(&db_path) {
        Ok(kv) => {
            let store = LandmarkStore::new(kv);
            let snapshot = store.snapshot();
            if snapshot.is_degraded() {
                warn!("[LandmarkFFI] Existing landmark data unreadable: {:?}", snapshot.health);
            }
            let engine = LandmarkEngine::with_config(store, config.unwrap_or_default());
            match LANDMARK_ENGINE.lock() {
                Ok(mut guard) => {
                    *guard = Some(engine);
                    info!(
                        "[LandmarkFFI] Initialized with {} landmarks",
                        snapshot.landmarks.len()
                    );
                    true
                }
                Err(e) => {
                    error!("[LandmarkFFI] Engine lock poisoned: {}", e);
                    false
                }
            }
        }
        Err(e) => {
            error!("[LandmarkFFI] Failed to open database: {:?}", e);
            false
        }
    }
}

/// Check if the engine is initialized.
#[uniffi::export]
pub fn landmark_engine_is_initialized() -> bool {
    LANDMARK_ENGINE
        .lock()
        .map(|guard| guard.is_some())
        .unwrap_or(false)
}

/// Replace the engine configuration.
#[uniffi::export]
pub fn landmark_engine_set_config(config: LandmarkConfig) {
    with_landmark_engine(|e| e.set_config(config));
}

// ============================================================================
// Location Feed
// ============================================================================

/// Record a location sample. Returns the update as JSON (a failed visit write
/// is reported in `detectionError`), or "null" if the engine is not initialized.
#[uniffi::export]
pub fn landmark_engine_record_location(point: GpsPoint) -> String {
    with_landmark_engine(|e| to_json(&e.record_location(point)))
        .unwrap_or_else(|| "null".to_string())
}

/// Drop all samples from the history window.
#[uniffi::export]
pub fn landmark_engine_clear_history() {
    with_landmark_engine(|e| e.clear_history());
}

/// Set and persist the home safe zone. A radius of 0 or less uses the
/// configured default. Returns false if the zone could not be saved; it is
/// still active for this session.
#[uniffi::export]
pub fn landmark_engine_set_safe_zone(home: GpsPoint, radius_m: f64) -> bool {
    let radius = (radius_m > 0.0).then_some(radius_m);
    with_landmark_engine(|e| match e.set_safe_zone(home, radius) {
        Ok(()) => true,
        Err(err) => {
            error!("[LandmarkFFI] Failed to save safe zone: {}", err);
            false
        }
    })
    .unwrap_or(false)
}

/// Remove the home safe zone. Returns false if the removal could not be saved.
#[uniffi::export]
pub fn landmark_engine_clear_safe_zone() -> bool {
    with_landmark_engine(|e| match e.clear_safe_zone() {
        Ok(()) => true,
        Err(err) => {
            error!("[LandmarkFFI] Failed to clear safe zone: {}", err);
            false
        }
    })
    .unwrap_or(false)
}

// ============================================================================
// Landmarks
// ============================================================================

/// All landmarks as a JSON array.
#[uniffi::export]
pub fn landmark_engine_get_landmarks_json() -> String {
    with_landmark_engine(|e| to_json(&e.store().list())).unwrap_or_else(|| "[]".to_string())
}

/// Store status as JSON: {"status":"healthy"|"empty"|"degraded", ...}.
#[uniffi::export]
pub fn landmark_engine_get_store_health_json() -> String {
    with_landmark_engine(|e| to_json(&e.store().snapshot().health))
        .unwrap_or_else(|| "null".to_string())
}

/// Add a landmark from draft JSON. Returns the stored record as JSON, or
/// "null" on failure.
#[uniffi::export]
pub fn landmark_engine_add_landmark_json(draft_json: String) -> String {
    let draft: LandmarkDraft = match serde_json::from_str(&draft_json) {
        Ok(d) => d,
        Err(e) => {
            warn!("[LandmarkFFI] Invalid landmark JSON: {}", e);
            return "null".to_string();
        }
    };
    with_landmark_engine(|e| match e.store().add(draft) {
        Ok(landmark) => to_json(&landmark),
        Err(err) => {
            error!("[LandmarkFFI] add failed: {}", err);
            "null".to_string()
        }
    })
    .unwrap_or_else(|| "null".to_string())
}

/// Merge patch JSON into a landmark. Returns the updated record as JSON, or
/// "null" if not found or on failure.
#[uniffi::export]
pub fn landmark_engine_update_landmark_json(id: String, patch_json: String) -> String {
    let patch: LandmarkPatch = match serde_json::from_str(&patch_json) {
        Ok(p) => p,
        Err(e) => {
            warn!("[LandmarkFFI] Invalid patch JSON: {}", e);
            return "null".to_string();
        }
    };
    with_landmark_engine(|e| match e.store().update(&id, patch) {
        Ok(Some(landmark)) => to_json(&landmark),
        Ok(None) => "null".to_string(),
        Err(err) => {
            error!("[LandmarkFFI] update failed: {}", err);
            "null".to_string()
        }
    })
    .unwrap_or_else(|| "null".to_string())
}

/// Remove a landmark. Returns true unless the removal could not be saved.
#[uniffi::export]
pub fn landmark_engine_remove_landmark(id: String) -> bool {
    with_landmark_engine(|e| match e.store().remove(&id) {
        Ok(_) => true,
        Err(err) => {
            error!("[LandmarkFFI] remove failed: {}", err);
            false
        }
    })
    .unwrap_or(false)
}

/// Suggest a landmark from the history window, as draft JSON or "null".
#[uniffi::export]
pub fn landmark_engine_suggest_landmark_json() -> String {
    with_landmark_engine(|e| to_json(&e.suggest_landmark())).unwrap_or_else(|| "null".to_string())
}

// ============================================================================
// Directions
// ============================================================================

/// Spoken directions from `current` to `target`.
#[uniffi::export]
pub fn landmark_engine_directions(current: GpsPoint, target: GpsPoint) -> String {
    with_landmark_engine(|e| e.directions(&current, &target)).unwrap_or_default()
}

/// Spoken directions home, or an empty string if no safe zone is set.
#[uniffi::export]
pub fn landmark_engine_directions_home(current: GpsPoint) -> String {
    with_landmark_engine(|e| e.directions_home(&current))
        .flatten()
        .unwrap_or_default()
}

// ============================================================================
// Geo Helpers
// ============================================================================

#[uniffi::export]
pub fn ffi_distance_meters(from: GpsPoint, to: GpsPoint) -> f64 {
    distance_meters(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[uniffi::export]
pub fn ffi_bearing_degrees(from: GpsPoint, to: GpsPoint) -> f64 {
    bearing_degrees(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[uniffi::export]
pub fn ffi_compass_direction(bearing: f64) -> CompassDirection {
    compass_direction(bearing)
}
