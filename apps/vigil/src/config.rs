//! # Check Configuration
//!
//! The two inputs of a check run:
//!
//! - the **check definition** (TOML), written once per kind of check: which
//!   gauges exist and which policy each one follows
//! - the **observations** (JSON), produced by the collector at every run:
//!   one reading per gauge, plus free findings, notes and performance data
//!
//! ```toml
//! name = "room-sensors"
//! description = "Environmental sensors of the server room"
//!
//! [[gauge]]
//! id = "temp"
//! label = "Temp"
//! warn_max = 80
//! crit_max = 90
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use vigil_core::{BaselineTrend, Reading, Severity, Thresholds, VigilError};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a check definition (1 MB).
pub const MAX_DEFINITION_FILE_SIZE: u64 = 1024 * 1024;

/// Maximum size of an observations document (16 MB).
pub const MAX_OBSERVATIONS_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a file after checking its size.
pub fn read_limited(path: &Path, max_size: u64) -> Result<Vec<u8>, VigilError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        VigilError::Io(format!("Cannot read metadata of '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(VigilError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > max_size {
        return Err(VigilError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    std::fs::read(path)
        .map_err(|e| VigilError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// CHECK DEFINITION
// =============================================================================

/// How a gauge classifies its reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugePolicy {
    /// Absolute bounds.
    #[default]
    Threshold,
    /// Bounds as factors of the reading.
    Factor,
    /// Comparison with the previous run.
    Baseline,
}

/// One gauge of a check definition.
#[derive(Debug, Clone, Deserialize)]
pub struct GaugeSpec {
    pub id: String,
    /// Shown in messages; the id when absent.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub policy: GaugePolicy,
    #[serde(flatten)]
    pub thresholds: Thresholds,
    /// Alert level of a baseline gauge.
    #[serde(default)]
    pub level: Option<Severity>,
    #[serde(default)]
    pub trend: Option<BaselineTrend>,
}

impl GaugeSpec {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

fn default_level() -> Severity {
    Severity::Ok
}

fn on_error_level() -> Severity {
    Severity::Critical
}

/// A check: its gauges and the notes framing its report.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Reported when nothing sets a level.
    #[serde(default = "default_level")]
    pub default_level: Severity,
    /// Level of the error response.
    #[serde(default = "on_error_level")]
    pub on_error: Severity,
    #[serde(default)]
    pub begin: Vec<String>,
    #[serde(default)]
    pub end: Vec<String>,
    #[serde(default, rename = "gauge")]
    pub gauges: Vec<GaugeSpec>,
}

impl CheckDefinition {
    /// Parse and validate a TOML definition.
    pub fn from_toml(text: &str) -> Result<Self, VigilError> {
        let definition: CheckDefinition = toml::from_str(text)
            .map_err(|e| VigilError::Config(format!("Invalid check definition: {}", e)))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Read, parse and validate a definition file.
    pub fn load(path: &Path) -> Result<Self, VigilError> {
        let bytes = read_limited(path, MAX_DEFINITION_FILE_SIZE)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| VigilError::Config(format!("Check definition is not UTF-8: {}", e)))?;
        Self::from_toml(&text)
    }

    /// First line of the description, as shown in the report.
    pub fn summary(&self) -> &str {
        self.description
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no description.")
    }

    fn validate(&self) -> Result<(), VigilError> {
        if self.name.trim().is_empty() {
            return Err(VigilError::Config("Check name must not be empty".to_string()));
        }

        let mut seen = BTreeSet::new();
        for gauge in &self.gauges {
            if gauge.id.trim().is_empty() {
                return Err(VigilError::Config("Gauge id must not be empty".to_string()));
            }
            if !seen.insert(gauge.id.as_str()) {
                return Err(VigilError::Config(format!(
                    "Duplicate gauge id '{}'",
                    gauge.id
                )));
            }
            if gauge.policy == GaugePolicy::Baseline {
                if gauge.level.is_none() {
                    return Err(VigilError::Config(format!(
                        "Baseline gauge '{}' needs a level",
                        gauge.id
                    )));
                }
                if gauge.trend.is_none() {
                    return Err(VigilError::Config(format!(
                        "Baseline gauge '{}' needs a trend",
                        gauge.id
                    )));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// OBSERVATIONS
// =============================================================================

/// What the collector observed for one gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observed {
    /// One `[label, reading]` pair per item (fans, disks, ...).
    Many(Vec<(String, Reading)>),
    One(Reading),
}

/// A classified message produced by the collector itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub level: Severity,
    pub message: String,
}

/// The collected data of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    #[serde(default)]
    pub readings: BTreeMap<String, Observed>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub perf: Vec<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
}

impl Observations {
    pub fn from_json(bytes: &[u8]) -> Result<Self, VigilError> {
        serde_json::from_slice(bytes)
            .map_err(|e| VigilError::Serialization(format!("Invalid observations: {}", e)))
    }

    /// Read and parse an observations file.
    pub fn load(path: &Path) -> Result<Self, VigilError> {
        let bytes = read_limited(path, MAX_OBSERVATIONS_FILE_SIZE)?;
        Self::from_json(&bytes)
    }

    pub fn reading(&self, gauge_id: &str) -> Result<&Observed, VigilError> {
        self.readings
            .get(gauge_id)
            .ok_or_else(|| VigilError::MissingReading(gauge_id.to_string()))
    }
}
