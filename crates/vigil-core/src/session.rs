//! # Host Session
//!
//! The persistent data of one monitored host, as seen by one check run.
//!
//! ## Storage Backends
//!
//! A session supports two storage backends:
//! - `InMemory`: a `MemoryStore`, volatile unless the owner saves it
//!   (the app's file backend writes it as a per-host JSON document)
//! - `Persistent`: a `RedbStore`, every write committed to disk

use crate::store::{BaselineStore, MemoryStore, RedbStore};
use crate::{Number, VigilError};
use std::path::Path;

/// Storage backend for a session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbStore (database handle) cannot be safely cloned.

/// A host name bound to its baseline store.
#[derive(Debug)]
pub struct HostSession {
    host: String,
    backend: StorageBackend,
}

impl HostSession {
    /// Create a session with an empty in-memory store.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_store(host, MemoryStore::new())
    }

    /// Create a session over an existing in-memory store.
    #[must_use]
    pub fn with_store(host: impl Into<String>, store: MemoryStore) -> Self {
        Self {
            host: host.into(),
            backend: StorageBackend::InMemory(store),
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(host: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, VigilError> {
        let redb = RedbStore::open(path)?;
        Ok(Self {
            host: host.into(),
            backend: StorageBackend::Persistent(redb),
        })
    }

    /// Name of the monitored host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The in-memory store, `None` for persistent backends.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryStore> {
        match &self.backend {
            StorageBackend::InMemory(store) => Some(store),
            StorageBackend::Persistent(_) => None,
        }
    }
}

impl BaselineStore for HostSession {
    fn get(&self, key: &str) -> Result<Option<Number>, VigilError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.get(key),
            StorageBackend::Persistent(redb) => redb.get(key),
        }
    }

    fn set(&mut self, key: &str, value: Number) -> Result<(), VigilError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store.set(key, value),
            StorageBackend::Persistent(redb) => redb.set(key, value),
        }
    }

    fn delete(&mut self, key: &str) -> Result<bool, VigilError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store.delete(key),
            StorageBackend::Persistent(redb) => redb.delete(key),
        }
    }

    fn entries(&self) -> Result<Vec<(String, Number)>, VigilError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.entries(),
            StorageBackend::Persistent(redb) => redb.entries(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
