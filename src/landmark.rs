//! Landmark records as persisted, plus the input shapes used to create and
//! partially update them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GpsPoint;

fn default_visit_count() -> u32 {
    1
}

/// A remembered physical location with visit history.
///
/// Serialized with camelCase field names; `lastVisited` is an ISO-8601
/// timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "Utc::now")]
    pub last_visited: DateTime<Utc>,
    #[serde(default = "default_visit_count")]
    pub visit_count: u32,
    /// Proposed by cluster analysis and not yet confirmed by the user
    #[serde(default)]
    pub suggested: bool,
}

impl Landmark {
    /// Position of the landmark.
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    /// Name for spoken output; unnamed landmarks get a generic phrase.
    pub fn spoken_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            "a familiar place"
        } else {
            trimmed
        }
    }

    /// Apply a partial update. Visit count never decreases.
    pub(crate) fn apply(&mut self, patch: LandmarkPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(latitude) = patch.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = patch.longitude {
            self.longitude = longitude;
        }
        if let Some(visit_count) = patch.visit_count {
            self.visit_count = self.visit_count.max(visit_count);
        }
        if let Some(suggested) = patch.suggested {
            self.suggested = suggested;
        }
    }

    /// Move `last_visited` forward to `now`, never backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_visited {
            self.last_visited = now;
        }
    }
}

/// Input for [`crate::LandmarkStore::add`].
///
/// Missing id and visit count are filled in by the store. Cluster analysis
/// returns drafts with `suggested = true` and no id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandmarkDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub visit_count: Option<u32>,
    pub suggested: bool,
}

impl LandmarkDraft {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_visit_count(mut self, visit_count: u32) -> Self {
        self.visit_count = Some(visit_count);
        self
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Partial update merged into an existing landmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandmarkPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub visit_count: Option<u32>,
    pub suggested: Option<bool>,
}

impl LandmarkPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Landmark {
        Landmark {
            id: "1700000000000".to_string(),
            name: "Corner shop".to_string(),
            description: String::new(),
            latitude: 12.90,
            longitude: 77.60,
            last_visited: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            visit_count: 3,
            suggested: false,
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "id",
            "name",
            "description",
            "latitude",
            "longitude",
            "lastVisited",
            "visitCount",
            "suggested",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["lastVisited"], "2024-03-01T09:30:00Z");
    }

    #[test]
    fn test_parses_records_written_by_older_clients() {
        // No description/suggested, millisecond ISO timestamp
        let json = r#"{"id":"1","name":"Park","latitude":1.0,"longitude":2.0,
                       "lastVisited":"2024-03-01T09:30:00.000Z","visitCount":2}"#;
        let landmark: Landmark = serde_json::from_str(json).unwrap();
        assert_eq!(landmark.visit_count, 2);
        assert!(!landmark.suggested);
        assert!(landmark.description.is_empty());
    }

    #[test]
    fn test_patch_never_lowers_visit_count() {
        let mut landmark = sample();
        landmark.apply(LandmarkPatch {
            visit_count: Some(1),
            name: Some("Shop".to_string()),
            ..LandmarkPatch::default()
        });
        assert_eq!(landmark.visit_count, 3);
        assert_eq!(landmark.name, "Shop");

        landmark.apply(LandmarkPatch {
            visit_count: Some(7),
            ..LandmarkPatch::default()
        });
        assert_eq!(landmark.visit_count, 7);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut landmark = sample();
        let before = landmark.last_visited;
        landmark.touch(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(landmark.last_visited, before);

        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        landmark.touch(later);
        assert_eq!(landmark.last_visited, later);
    }

    #[test]
    fn test_spoken_name_fallback() {
        let mut landmark = sample();
        assert_eq!(landmark.spoken_name(), "Corner shop");
        landmark.name = "  ".to_string();
        assert_eq!(landmark.spoken_name(), "a familiar place");
    }
}
