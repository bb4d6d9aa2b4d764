//! Unified error handling for the landmark engine.
//!
//! Only mutating operations surface errors. Reads degrade to an empty
//! collection (see [`crate::store::StoreHealth`]) and "not found" is reported
//! through `Option`/`bool` results rather than through this type.

use thiserror::Error;

/// Unified error type for landmark operations.
#[derive(Debug, Error)]
pub enum LandmarkError {
    /// The key-value collaborator could not be read or written
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Persisted landmark data exists but cannot be decoded
    #[error("Stored landmark data is corrupt: {message}")]
    CorruptData { message: String },

    /// A landmark with the supplied id is already stored
    #[error("Landmark '{id}' already exists")]
    DuplicateId { id: String },

    /// Latitude/longitude outside WGS-84 ranges or not finite
    #[error("Invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "persistence")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl LandmarkError {
    /// Build a persistence error from any displayable cause.
    pub fn persistence(cause: impl std::fmt::Display) -> Self {
        LandmarkError::Persistence {
            message: cause.to_string(),
        }
    }
}

/// Result type alias for landmark operations.
pub type Result<T> = std::result::Result<T, LandmarkError>;
