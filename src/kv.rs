//! Key-value persistence collaborators.
//!
//! The landmark store keeps its whole collection under one key, so the
//! collaborator only needs whole-value `get`/`set`.

use std::collections::HashMap;

use crate::error::{LandmarkError, Result};

/// Byte-oriented key-value storage used by [`crate::LandmarkStore`].
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`, `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value stored under `key`.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

/// In-process key-value store.
///
/// Writes can be switched off with [`MemoryKv::fail_writes`] to exercise
/// failure handling in callers.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, Vec<u8>>,
    fail_writes: bool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a raw value.
    pub fn with_entry(key: &str, value: impl Into<Vec<u8>>) -> Self {
        let mut kv = Self::new();
        kv.entries.insert(key.to_string(), value.into());
        kv
    }

    /// Make every subsequent `set` fail.
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(LandmarkError::persistence(format!(
                "write to '{}' rejected",
                key
            )));
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
