//! # Landmark Store
//!
//! Owns the canonical landmark collection, persisted as one JSON array under a
//! single key of a [`KeyValueStore`].
//!
//! Every mutation is a read-modify-write performed while holding the store
//! lock, so concurrent visits to the same landmark never lose an increment.
//! The lock is held for exactly one collaborator read and at most one write.
//!
//! Reads never fail: an absent value is an empty store, an unreadable one is
//! reported through [`StoreHealth::Degraded`] alongside an empty collection.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{LandmarkError, Result};
use crate::kv::{KeyValueStore, MemoryKv};
use crate::{GpsPoint, Landmark, LandmarkDraft, LandmarkPatch, SafeZone};

/// Key holding the landmark collection.
pub const LANDMARKS_KEY: &str = "landmarks";

/// Key holding the home safe zone.
pub const SAFE_ZONE_KEY: &str = "safeZone";

/// Outcome of reading the persisted collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StoreHealth {
    /// Collection read and decoded
    Healthy,
    /// Nothing persisted yet
    Empty,
    /// Persisted data could not be read or decoded; reads fall back to empty
    Degraded { reason: String },
}

/// A consistent copy of the collection plus how it was obtained.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub landmarks: Vec<Landmark>,
    pub health: StoreHealth,
}

impl StoreSnapshot {
    pub fn is_degraded(&self) -> bool {
        matches!(self.health, StoreHealth::Degraded { .. })
    }
}

/// Durable landmark collection with serialized mutations.
pub struct LandmarkStore {
    kv: Mutex<Box<dyn KeyValueStore>>,
    key: String,
}

impl LandmarkStore {
    /// Create a store over the given collaborator using the default key.
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self::with_key(kv, LANDMARKS_KEY)
    }

    /// Create a store that keeps its collection under a custom key.
    pub fn with_key(kv: impl KeyValueStore + 'static, key: &str) -> Self {
        Self {
            kv: Mutex::new(Box::new(kv)),
            key: key.to_string(),
        }
    }

    /// Create a store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(MemoryKv::new())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        // The guarded value is only the collaborator handle; a panic in another
        // holder cannot leave it half-updated.
        self.kv.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read the collection and report whether it was healthy.
    pub fn snapshot(&self) -> StoreSnapshot {
        let kv = self.lock();
        match read_collection(&**kv, &self.key) {
            Ok(Some(landmarks)) => StoreSnapshot {
                landmarks,
                health: StoreHealth::Healthy,
            },
            Ok(None) => StoreSnapshot {
                landmarks: Vec::new(),
                health: StoreHealth::Empty,
            },
            Err(e) => {
                warn!("[LandmarkStore] Read failed, degrading to empty: {}", e);
                StoreSnapshot {
                    landmarks: Vec::new(),
                    health: StoreHealth::Degraded {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// All landmarks in insertion order; empty if the store is empty or unreadable.
    pub fn list(&self) -> Vec<Landmark> {
        self.snapshot().landmarks
    }

    /// Look up a single landmark by id.
    pub fn get(&self, id: &str) -> Option<Landmark> {
        self.list().into_iter().find(|l| l.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Run `f` against the current collection and persist the result if `f`
    /// reports a change. The lock is held across the read and the write.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Landmark>) -> Result<(R, bool)>) -> Result<R> {
        let mut kv = self.lock();
        let mut landmarks = read_collection(&**kv, &self.key)?.unwrap_or_default();

        let (result, changed) = f(&mut landmarks)?;
        if changed {
            let bytes = serde_json::to_vec(&landmarks)?;
            kv.set(&self.key, &bytes)?;
        }
        Ok(result)
    }

    /// Store a new landmark.
    ///
    /// Assigns a UUID if the draft has no id, defaults the visit count to 1 and
    /// stamps `last_visited` with the current time.
    pub fn add(&self, draft: LandmarkDraft) -> Result<Landmark> {
        if !draft.point().is_valid() {
            return Err(LandmarkError::InvalidCoordinates {
                latitude: draft.latitude,
                longitude: draft.longitude,
            });
        }

        let landmark = self.mutate(|landmarks| {
            let id = match draft.id.filter(|id| !id.is_empty()) {
                Some(id) => {
                    if landmarks.iter().any(|l| l.id == id) {
                        return Err(LandmarkError::DuplicateId { id });
                    }
                    id
                }
                None => Uuid::new_v4().to_string(),
            };

            let landmark = Landmark {
                id,
                name: draft.name,
                description: draft.description,
                latitude: draft.latitude,
                longitude: draft.longitude,
                last_visited: Utc::now(),
                visit_count: draft.visit_count.filter(|&n| n > 0).unwrap_or(1),
                suggested: draft.suggested,
            };
            landmarks.push(landmark.clone());
            Ok((landmark, true))
        })?;

        info!(
            "[LandmarkStore] Added landmark {} ({:.6}, {:.6})",
            landmark.id, landmark.latitude, landmark.longitude
        );
        Ok(landmark)
    }

    /// Delete a landmark. Removing an unknown id succeeds; the returned flag
    /// tells whether anything was deleted.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.mutate(|landmarks| {
            let before = landmarks.len();
            landmarks.retain(|l| l.id != id);
            let removed = landmarks.len() != before;
            Ok((removed, removed))
        })?;

        if removed {
            info!("[LandmarkStore] Removed landmark {}", id);
        } else {
            debug!("[LandmarkStore] Remove of unknown landmark {} ignored", id);
        }
        Ok(removed)
    }

    /// Merge `patch` into the landmark with `id` and refresh `last_visited`.
    ///
    /// Returns `Ok(None)` if no such landmark exists.
    pub fn update(&self, id: &str, patch: LandmarkPatch) -> Result<Option<Landmark>> {
        let latitude = patch.latitude;
        let longitude = patch.longitude;
        self.modify(id, move |landmark| {
            let target = GpsPoint::new(
                latitude.unwrap_or(landmark.latitude),
                longitude.unwrap_or(landmark.longitude),
            );
            if !target.is_valid() {
                return Err(LandmarkError::InvalidCoordinates {
                    latitude: target.latitude,
                    longitude: target.longitude,
                });
            }
            landmark.apply(patch);
            Ok(())
        })
    }

    /// Count one more visit to the landmark with `id`.
    ///
    /// The increment happens on the persisted value under the store lock, so
    /// concurrent visits are never lost. Returns `Ok(None)` if the landmark no
    /// longer exists.
    pub fn record_visit(&self, id: &str) -> Result<Option<Landmark>> {
        self.modify(id, |landmark| {
            landmark.visit_count = landmark.visit_count.saturating_add(1);
            Ok(())
        })
    }

    fn modify(
        &self,
        id: &str,
        f: impl FnOnce(&mut Landmark) -> Result<()>,
    ) -> Result<Option<Landmark>> {
        self.mutate(|landmarks| match landmarks.iter_mut().find(|l| l.id == id) {
            Some(landmark) => {
                f(landmark)?;
                landmark.touch(Utc::now());
                Ok((Some(landmark.clone()), true))
            }
            None => Ok((None, false)),
        })
    }

    // ========================================================================
    // Safe Zone
    // ========================================================================

    /// The persisted home safe zone, if one was saved and is readable.
    pub fn load_safe_zone(&self) -> Option<SafeZone> {
        let kv = self.lock();
        let bytes = match kv.get(SAFE_ZONE_KEY) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!("[LandmarkStore] Safe zone read failed: {}", e);
                return None;
            }
        };
        match serde_json::from_slice::<Option<SafeZone>>(&bytes) {
            Ok(zone) => zone.filter(|z| z.home.is_valid() && z.radius_m.is_finite()),
            Err(e) => {
                warn!("[LandmarkStore] Safe zone unreadable, ignoring: {}", e);
                None
            }
        }
    }

    /// Persist the home safe zone; `None` clears it.
    pub fn save_safe_zone(&self, zone: Option<&SafeZone>) -> Result<()> {
        let bytes = serde_json::to_vec(&zone)?;
        self.lock().set(SAFE_ZONE_KEY, &bytes)
    }
}

/// Decode the collection stored under `key`. `Ok(None)` means nothing stored.
fn read_collection(kv: &dyn KeyValueStore, key: &str) -> Result<Option<Vec<Landmark>>> {
    let Some(bytes) = kv.get(key)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| LandmarkError::CorruptData {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LandmarkDraft {
        LandmarkDraft::new(12.90, 77.60).with_name("Temple")
    }

    #[test]
    fn test_add_then_list() {
        let store = LandmarkStore::in_memory();
        let added = store.add(draft().with_description("Blue gate")).unwrap();

        assert!(!added.id.is_empty());
        assert_eq!(added.visit_count, 1);
        assert!(!added.suggested);

        let all = store.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Temple");
        assert_eq!(all[0].latitude, 12.90);
        assert_eq!(all[0].longitude, 77.60);
        assert_eq!(all[0].description, "Blue gate");
    }

    #[test]
    fn test_add_keeps_supplied_id_and_visit_count() {
        let store = LandmarkStore::in_memory();
        let added = store
            .add(draft().with_id("temple").with_visit_count(3))
            .unwrap();
        assert_eq!(added.id, "temple");
        assert_eq!(added.visit_count, 3);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let store = LandmarkStore::in_memory();
        store.add(draft().with_id("temple")).unwrap();
        let err = store.add(draft().with_id("temple")).unwrap_err();
        assert!(matches!(err, LandmarkError::DuplicateId { .. }));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_coordinates() {
        let store = LandmarkStore::in_memory();
        let err = store.add(LandmarkDraft::new(95.0, 0.0)).unwrap_err();
        assert!(matches!(err, LandmarkError::InvalidCoordinates { .. }));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = LandmarkStore::in_memory();
        for name in ["a", "b", "c"] {
            store.add(draft().with_name(name)).unwrap();
        }
        let names: Vec<String> = store.list().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = LandmarkStore::in_memory();
        let added = store.add(draft()).unwrap();

        assert!(store.remove(&added.id).unwrap());
        assert!(store.list().is_empty());
        assert!(!store.remove(&added.id).unwrap());
        assert!(!store.remove("never-existed").unwrap());
    }

    #[test]
    fn test_update_merges_and_refreshes_timestamp() {
        let store = LandmarkStore::in_memory();
        let added = store.add(draft().with_description("Blue gate")).unwrap();

        let updated = store
            .update(&added.id, LandmarkPatch::name("Old temple"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Old temple");
        assert_eq!(updated.description, "Blue gate");
        assert!(updated.last_visited >= added.last_visited);
        assert_eq!(store.get(&added.id).unwrap().name, "Old temple");
    }

    #[test]
    fn test_update_with_empty_patch_still_touches() {
        let store = LandmarkStore::in_memory();
        let added = store.add(draft()).unwrap();
        let updated = store
            .update(&added.id, LandmarkPatch::default())
            .unwrap()
            .unwrap();
        assert!(updated.last_visited >= added.last_visited);
        assert_eq!(updated.visit_count, added.visit_count);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = LandmarkStore::in_memory();
        assert!(store
            .update("missing", LandmarkPatch::name("x"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_rejects_invalid_coordinates() {
        let store = LandmarkStore::in_memory();
        let added = store.add(draft()).unwrap();
        let patch = LandmarkPatch {
            longitude: Some(f64::NAN),
            ..LandmarkPatch::default()
        };
        assert!(store.update(&added.id, patch).is_err());
        assert_eq!(store.get(&added.id).unwrap().longitude, 77.60);
    }

    #[test]
    fn test_record_visit_increments() {
        let store = LandmarkStore::in_memory();
        let added = store.add(draft().with_visit_count(3)).unwrap();
        let visited = store.record_visit(&added.id).unwrap().unwrap();
        assert_eq!(visited.visit_count, 4);
        assert_eq!(store.get(&added.id).unwrap().visit_count, 4);
        assert!(store.record_visit("missing").unwrap().is_none());
    }

    #[test]
    fn test_empty_and_healthy_status() {
        let store = LandmarkStore::in_memory();
        assert_eq!(store.snapshot().health, StoreHealth::Empty);

        store.add(draft()).unwrap();
        assert_eq!(store.snapshot().health, StoreHealth::Healthy);
    }

    #[test]
    fn test_corrupt_data_degrades_reads() {
        let store = LandmarkStore::new(MemoryKv::with_entry(LANDMARKS_KEY, "{not json"));

        let snapshot = store.snapshot();
        assert!(snapshot.is_degraded());
        assert!(snapshot.landmarks.is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_corrupt_data_fails_mutations_without_overwriting() {
        let store = LandmarkStore::new(MemoryKv::with_entry(LANDMARKS_KEY, "{not json"));

        let err = store.add(draft()).unwrap_err();
        assert!(matches!(err, LandmarkError::CorruptData { .. }));
        assert!(store.remove("x").is_err());
        assert!(store.snapshot().is_degraded());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let store = LandmarkStore::new(MemoryKv::new().fail_writes(true));
        let err = store.add(draft()).unwrap_err();
        assert!(matches!(err, LandmarkError::Persistence { .. }));
        assert!(store.list().is_empty());
    }

    /// Collaborator already holding one landmark, refusing every write.
    fn read_only_with_landmark() -> LandmarkStore {
        let seeded = r#"[{"id":"a","name":"Temple","latitude":12.9,"longitude":77.6,"visitCount":3}]"#;
        LandmarkStore::new(MemoryKv::with_entry(LANDMARKS_KEY, seeded).fail_writes(true))
    }

    #[test]
    fn test_update_write_failure_is_reported() {
        let store = read_only_with_landmark();
        let err = store.update("a", LandmarkPatch::name("Shrine")).unwrap_err();
        assert!(matches!(err, LandmarkError::Persistence { .. }));
        assert_eq!(store.get("a").unwrap().name, "Temple");
    }

    #[test]
    fn test_remove_write_failure_is_reported() {
        let store = read_only_with_landmark();
        let err = store.remove("a").unwrap_err();
        assert!(matches!(err, LandmarkError::Persistence { .. }));
        assert!(store.get("a").is_some());

        // Nothing to write, nothing to fail
        assert!(!store.remove("missing").unwrap());
    }

    #[test]
    fn test_visit_write_failure_is_reported() {
        let store = read_only_with_landmark();
        let err = store.record_visit("a").unwrap_err();
        assert!(matches!(err, LandmarkError::Persistence { .. }));
        assert_eq!(store.get("a").unwrap().visit_count, 3);
    }

    #[test]
    fn test_safe_zone_round_trip() {
        let store = LandmarkStore::in_memory();
        assert!(store.load_safe_zone().is_none());

        let zone = SafeZone::new(GpsPoint::new(12.9716, 77.5946), 300.0);
        store.save_safe_zone(Some(&zone)).unwrap();
        assert_eq!(store.load_safe_zone(), Some(zone));

        store.save_safe_zone(None).unwrap();
        assert!(store.load_safe_zone().is_none());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_unreadable_safe_zone_is_ignored() {
        let store = LandmarkStore::new(MemoryKv::with_entry(SAFE_ZONE_KEY, "{oops"));
        assert!(store.load_safe_zone().is_none());
    }

    #[test]
    fn test_custom_key() {
        let store = LandmarkStore::with_key(MemoryKv::new(), "landmarks-v2");
        store.add(draft()).unwrap();
        assert_eq!(store.list().len(), 1);
    }
}
