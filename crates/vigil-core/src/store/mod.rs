//! # Baseline Store
//!
//! The key/value contract through which gauges persist their baselines
//! between check runs, plus the in-memory implementation.
//!
//! The engine only ever reads a baseline, then writes the new one. Where the
//! values live (a JSON file per host, a redb database) is the owner's
//! business: see [`crate::session`] and [`crate::formats`].

mod redb_store;

pub use redb_store::RedbStore;

use crate::primitives::BASELINE_KEY_SUFFIX;
use crate::{Number, VigilError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store key of the baseline of `gauge_id`.
#[must_use]
pub fn baseline_key(gauge_id: &str) -> String {
    format!("{}{}", gauge_id, BASELINE_KEY_SUFFIX)
}

/// Persistent key/value mapping of one host.
pub trait BaselineStore {
    /// Value stored under `key`, `None` if never set.
    fn get(&self, key: &str) -> Result<Option<Number>, VigilError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Number) -> Result<(), VigilError>;

    /// Remove `key`. Returns whether it was present.
    fn delete(&mut self, key: &str) -> Result<bool, VigilError>;

    /// All entries, ordered by key.
    fn entries(&self) -> Result<Vec<(String, Number)>, VigilError>;
}

/// In-memory store.
///
/// Uses `BTreeMap` so that entries come out in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    values: BTreeMap<String, Number>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Number)> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = (String, Number)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl BaselineStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Number>, VigilError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: Number) -> Result<(), VigilError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, VigilError> {
        Ok(self.values.remove(key).is_some())
    }

    fn entries(&self) -> Result<Vec<(String, Number)>, VigilError> {
        Ok(self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
