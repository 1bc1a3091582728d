//! # redb-backed Baseline Store
//!
//! A disk-backed baseline store using the redb embedded database.
//!
//! Every `set` and `delete` is its own committed transaction, so a baseline
//! written during a check run survives the process exit that follows.
//! Values are postcard-encoded so that integral and float baselines keep
//! their kind.

use super::BaselineStore;
use crate::{Number, VigilError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Table for baselines: store key -> postcard-encoded value
const BASELINES: TableDefinition<&str, &[u8]> = TableDefinition::new("baselines");

/// On-disk encoding of a baseline value.
///
/// `Number` deserializes untagged, which postcard cannot do.
#[derive(Serialize, Deserialize)]
enum Stored {
    Int(i64),
    Float(f64),
}

impl From<Number> for Stored {
    fn from(value: Number) -> Self {
        match value {
            Number::Int(v) => Stored::Int(v),
            Number::Float(v) => Stored::Float(v),
        }
    }
}

impl From<Stored> for Number {
    fn from(value: Stored) -> Self {
        match value {
            Stored::Int(v) => Number::Int(v),
            Stored::Float(v) => Number::Float(v),
        }
    }
}

fn store_err(e: impl std::fmt::Display) -> VigilError {
    VigilError::Store(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<Number, VigilError> {
    postcard::from_bytes::<Stored>(bytes)
        .map(Number::from)
        .map_err(|e| VigilError::Serialization(e.to_string()))
}

/// A disk-backed baseline store.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VigilError> {
        let db = Database::create(path.as_ref()).map_err(store_err)?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db.begin_write().map_err(store_err)?;
            let _ = write_txn.open_table(BASELINES).map_err(store_err)?;
            write_txn.commit().map_err(store_err)?;
        }

        Ok(Self { db })
    }
}

impl BaselineStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Number>, VigilError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let table = read_txn.open_table(BASELINES).map_err(store_err)?;

        match table.get(key).map_err(store_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: Number) -> Result<(), VigilError> {
        let bytes = postcard::to_allocvec(&Stored::from(value))
            .map_err(|e| VigilError::Serialization(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = write_txn.open_table(BASELINES).map_err(store_err)?;
            table.insert(key, bytes.as_slice()).map_err(store_err)?;
        }
        write_txn.commit().map_err(store_err)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, VigilError> {
        let write_txn = self.db.begin_write().map_err(store_err)?;
        let existed = {
            let mut table = write_txn.open_table(BASELINES).map_err(store_err)?;
            let removed = table.remove(key).map_err(store_err)?;
            removed.is_some()
        };
        write_txn.commit().map_err(store_err)?;
        Ok(existed)
    }

    fn entries(&self) -> Result<Vec<(String, Number)>, VigilError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let table = read_txn.open_table(BASELINES).map_err(store_err)?;

        let mut entries = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (key, value) = entry.map_err(store_err)?;
            entries.push((key.value().to_string(), decode(value.value())?));
        }
        Ok(entries)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        assert_eq!(store.get("disk_etalon").expect("get"), None);
        store.set("disk_etalon", Number::Float(42.0)).expect("set");
        assert_eq!(store.get("disk_etalon").expect("get"), Some(Number::Float(42.0)));

        assert!(store.delete("disk_etalon").expect("delete"));
        assert!(!store.delete("disk_etalon").expect("delete"));
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.set("fan0_etalon", Number::Int(3000)).expect("set");
            store.set("disk_etalon", Number::Float(42.5)).expect("set");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        let entries = store.entries().expect("entries");
        assert_eq!(
            entries,
            vec![
                ("disk_etalon".to_string(), Number::Float(42.5)),
                ("fan0_etalon".to_string(), Number::Int(3000)),
            ]
        );
        // Integral baselines stay integral across a reopen.
        assert_eq!(entries[1].1.to_string(), "3000");
    }
}
