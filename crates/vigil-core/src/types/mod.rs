//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the engine:
//! - Check outcome (`Severity`) and its merge lattice
//! - Gauge magnitudes (`Number`) and raw observations (`Reading`)
//! - Error types (`VigilError`)
//!
//! ## Severity Is Not Ordered
//!
//! `Severity` deliberately does not implement `Ord`. The only way two
//! severities are combined is [`Severity::merge`], a transition function
//! that is not a maximum under any ordering of the four levels.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

// =============================================================================
// SEVERITY
// =============================================================================

/// Outcome level of a check, mapped to a process exit code.
///
/// | Severity | exit code |
/// |----------|-----------|
/// | OK       | 0         |
/// | WARNING  | 1         |
/// | CRITICAL | 2         |
/// | UNKNOWN  | 3         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// All severities, in exit code order.
    pub const ALL: [Severity; 4] = [
        Severity::Ok,
        Severity::Warning,
        Severity::Critical,
        Severity::Unknown,
    ];

    /// Order in which severity sections are reported and counted.
    pub const REPORT_ORDER: [Severity; 4] = [
        Severity::Critical,
        Severity::Warning,
        Severity::Unknown,
        Severity::Ok,
    ];

    /// Upper-case name, as shown in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Process exit code for this severity.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }

    /// Name and exit code, e.g. `CRITICAL (exit_code=2)`.
    #[must_use]
    pub fn info(self) -> String {
        format!("{} (exit_code={})", self.name(), self.exit_code())
    }

    /// Position of this severity in [`Severity::ALL`].
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.exit_code() as usize
    }

    /// Combine the current (possibly unset) severity with an incoming one.
    ///
    /// The incoming severity replaces the current one only when:
    /// - nothing is set yet, or the current severity is UNKNOWN
    /// - the incoming severity is CRITICAL
    /// - the current severity is OK and the incoming one is WARNING
    ///
    /// Every other combination keeps the current severity. UNKNOWN never
    /// overwrites a known result and CRITICAL latches.
    #[must_use]
    pub fn merge(current: Option<Severity>, incoming: Severity) -> Severity {
        match (current, incoming) {
            (None | Some(Severity::Unknown), _) => incoming,
            (_, Severity::Critical) => Severity::Critical,
            (Some(Severity::Ok), Severity::Warning) => Severity::Warning,
            (Some(kept), _) => kept,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Severity::Ok),
            "WARNING" => Ok(Severity::Warning),
            "CRITICAL" => Ok(Severity::Critical),
            "UNKNOWN" => Ok(Severity::Unknown),
            _ => Err(VigilError::InvalidSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = VigilError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// =============================================================================
// NUMBER
// =============================================================================

/// A gauge magnitude.
///
/// Remembers whether the value was integral so that it renders the way it
/// was configured or collected: `80` stays `80`, `85.0` stays `85.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// The value as a float, for comparisons.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// Multiply by a factor. Stays integral when both sides are integral
    /// and the product fits.
    #[must_use]
    pub fn scaled(self, factor: Number) -> Number {
        match (self, factor) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map_or_else(|| Number::Float(a as f64 * b as f64), Number::Int),
            _ => Number::Float(self.as_f64() * factor.as_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.partial_cmp(b),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(v) => write!(f, "{}", v),
            // Integral floats keep a fractional digit so they read as floats.
            Number::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

// =============================================================================
// READING
// =============================================================================

/// First run of ASCII digits and decimal separators inside a text reading.
static MAGNITUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9,.]+").expect("valid regex"));

/// One raw observation handed to a gauge.
///
/// Collectors often return numbers embedded in text (`"85 C"`, `"3,5 GB"`);
/// those stay text until a gauge asks for their magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(Number),
    Text(String),
}

impl Reading {
    /// The numeric value used by threshold policies.
    ///
    /// Numbers are returned as is. For text, the first run of digits,
    /// commas and periods is taken, commas become periods and the result is
    /// parsed as a float. Text without such a run, or with a run that does
    /// not parse (`"1.2.3"`), has no magnitude.
    #[must_use]
    pub fn magnitude(&self) -> Option<Number> {
        match self {
            Reading::Number(n) => Some(*n),
            Reading::Text(text) => {
                let run = MAGNITUDE_RE.find(text)?;
                run.as_str()
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .map(Number::Float)
            }
        }
    }

    /// The value only when the reading is numeric, without text extraction.
    #[must_use]
    pub fn number(&self) -> Option<Number> {
        match self {
            Reading::Number(n) => Some(*n),
            Reading::Text(_) => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(n) => n.fmt(f),
            Reading::Text(t) => f.write_str(t),
        }
    }
}

impl From<Number> for Reading {
    fn from(value: Number) -> Self {
        Reading::Number(value)
    }
}

impl From<i64> for Reading {
    fn from(value: i64) -> Self {
        Reading::Number(Number::Int(value))
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(Number::Float(value))
    }
}

impl From<&str> for Reading {
    fn from(value: &str) -> Self {
        Reading::Text(value.to_string())
    }
}

impl From<String> for Reading {
    fn from(value: String) -> Self {
        Reading::Text(value)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Vigil engine.
///
/// Observations that do not parse are not errors: gauges record them and
/// move on. These variants cover configuration mistakes and store failures.
#[derive(Debug, Error)]
pub enum VigilError {
    /// A textual severity did not name one of OK, WARNING, CRITICAL, UNKNOWN.
    #[error("A response level must be one of OK, WARNING, CRITICAL, UNKNOWN, found: {0:?}")]
    InvalidSeverity(String),

    /// A message was supplied without a severity to file it under.
    #[error("A message was given without a response level")]
    MissingSeverity,

    /// The baseline store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A check definition is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured gauge received no reading.
    #[error("No reading collected for gauge {0:?}")]
    MissingReading(String),

    /// A required host parameter is missing.
    #[error("Missing \"{0}\" parameter")]
    MissingHostParameter(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let codes: Vec<_> = Severity::ALL.iter().map(|s| s.exit_code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        assert_eq!(Severity::Critical.info(), "CRITICAL (exit_code=2)");
    }

    #[test]
    fn merge_unknown_is_a_placeholder() {
        assert_eq!(Severity::merge(Some(Severity::Unknown), Severity::Ok), Severity::Ok);
        assert_eq!(Severity::merge(Some(Severity::Ok), Severity::Unknown), Severity::Ok);
        assert_eq!(
            Severity::merge(Some(Severity::Warning), Severity::Unknown),
            Severity::Warning
        );
    }

    #[test]
    fn merge_critical_latches() {
        for incoming in [Severity::Ok, Severity::Warning, Severity::Unknown] {
            assert_eq!(
                Severity::merge(Some(Severity::Critical), incoming),
                Severity::Critical
            );
        }
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!("critical".parse::<Severity>().expect("parse"), Severity::Critical);
        assert_eq!(" Ok ".parse::<Severity>().expect("parse"), Severity::Ok);
        assert!(matches!(
            "FATAL".parse::<Severity>(),
            Err(VigilError::InvalidSeverity(_))
        ));
    }

    #[test]
    fn number_display_keeps_integral_floats_as_floats() {
        assert_eq!(Number::Int(80).to_string(), "80");
        assert_eq!(Number::Float(85.0).to_string(), "85.0");
        assert_eq!(Number::Float(42.5).to_string(), "42.5");
    }

    #[test]
    fn number_scaled() {
        assert_eq!(Number::Int(10).scaled(Number::Int(2)), Number::Int(20));
        assert_eq!(Number::Int(10).scaled(Number::Float(0.5)).to_string(), "5.0");
    }

    #[test]
    fn magnitude_extraction() {
        assert_eq!(Reading::from("85 C").magnitude(), Some(Number::Float(85.0)));
        assert_eq!(Reading::from("3,5 GB").magnitude(), Some(Number::Float(3.5)));
        assert_eq!(Reading::from("fan 2: 3000 rpm").magnitude(), Some(Number::Float(2.0)));
        assert_eq!(Reading::from("no data").magnitude(), None);
        assert_eq!(Reading::from("1.2.3").magnitude(), None);
        assert_eq!(Reading::from(7_i64).magnitude(), Some(Number::Int(7)));
    }

    #[test]
    fn magnitude_ignores_non_ascii_digits() {
        assert_eq!(
            Reading::from("sensor \u{0663}: 85 C").magnitude(),
            Some(Number::Float(85.0))
        );
        assert_eq!(Reading::from("\u{0663}\u{0664}").magnitude(), None);
    }

    #[test]
    fn reading_deserializes_numbers_and_text() {
        let readings: Vec<Reading> =
            serde_json::from_str(r#"[42, 42.0, "85 C"]"#).expect("parse");
        assert_eq!(readings[0].to_string(), "42");
        assert_eq!(readings[1].to_string(), "42.0");
        assert_eq!(readings[2], Reading::from("85 C"));
    }
}
