//! # Per-host Store Document
//!
//! JSON layout of the file backend: one document per monitored host.
//!
//! ```json
//! { "format_version": 1, "host": "web01", "values": { "disk_etalon": 42.0 } }
//! ```
//!
//! File I/O is in the app layer; this module only converts bytes.
//!
//! Size and `format_version` are validated before the values are parsed.

use crate::primitives::{MAX_STORE_FILE_SIZE, STORE_FORMAT_VERSION};
use crate::store::MemoryStore;
use crate::VigilError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct StoreDocument {
    format_version: u32,
    host: String,
    values: MemoryStore,
}

/// Only the version field, read before anything else.
#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

/// File name of the store document of `host`.
///
/// Path separators in the host name are replaced so the document always
/// lands in the store directory.
#[must_use]
pub fn store_file_name(host: &str) -> String {
    let safe: String = host
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}_persistent_data.json", safe)
}

/// Serialize the baselines of `host`.
pub fn store_to_json(host: &str, store: &MemoryStore) -> Result<Vec<u8>, VigilError> {
    let document = StoreDocument {
        format_version: STORE_FORMAT_VERSION,
        host: host.to_string(),
        values: store.clone(),
    };
    serde_json::to_vec_pretty(&document).map_err(|e| VigilError::Serialization(e.to_string()))
}

/// Deserialize a store document into its host name and baselines.
pub fn store_from_json(bytes: &[u8]) -> Result<(String, MemoryStore), VigilError> {
    if bytes.len() > MAX_STORE_FILE_SIZE {
        return Err(VigilError::Serialization(format!(
            "Store document size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_STORE_FILE_SIZE
        )));
    }

    let header: VersionHeader = serde_json::from_slice(bytes)
        .map_err(|e| VigilError::Serialization(format!("Invalid store document: {}", e)))?;
    if header.format_version != STORE_FORMAT_VERSION {
        return Err(VigilError::Serialization(format!(
            "Unsupported store format version: {} (expected {})",
            header.format_version, STORE_FORMAT_VERSION
        )));
    }

    let document: StoreDocument = serde_json::from_slice(bytes)
        .map_err(|e| VigilError::Serialization(format!("Invalid store document: {}", e)))?;
    Ok((document.host, document.values))
}

// =============================================================================
// TESTS
// =============================================================================
