//! # Gauge Module
//!
//! Classification of single observations for the Vigil engine.
//!
//! - Every evaluation records `"<label> : <reading>"` in the *more* section
//! - Threshold policies emit at most one message, in fixed priority order
//! - Baseline policies compare against the value persisted by the
//!   previous run, then persist the current value
//! - No evaluation ever fails: unusable readings only skip the comparison

use crate::report::StatusReport;
use crate::store::{BaselineStore, baseline_key};
use crate::{Number, Reading, Severity, VigilError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optional bounds of a threshold or factor policy.
///
/// An absent bound is not configured and never matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub warn_min: Option<Number>,
    pub crit_min: Option<Number>,
    pub warn_max: Option<Number>,
    pub crit_max: Option<Number>,
}

fn bound(value: Option<Number>) -> String {
    value.map_or_else(|| "None".to_string(), |n| n.to_string())
}

impl fmt::Display for Thresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "warn_min={},crit_min={},warn_max={},crit_max={}",
            bound(self.warn_min),
            bound(self.crit_min),
            bound(self.warn_max),
            bound(self.crit_max)
        )
    }
}

/// Which move away from the baseline raises an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum BaselineTrend {
    /// Alerts when the value dropped below the baseline.
    Changed,
    /// Alerts when the value dropped below the baseline.
    Decreased,
    /// Alerts when the value rose above the baseline.
    Increased,
}

impl BaselineTrend {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BaselineTrend::Changed => "changed",
            BaselineTrend::Decreased => "decreased",
            BaselineTrend::Increased => "increased",
        }
    }

    /// Whether `value` moved away from `baseline` in this direction.
    ///
    /// `Changed` uses the same test as `Decreased`; only the wording differs.
    fn fires(self, value: Number, baseline: Number) -> bool {
        match self {
            BaselineTrend::Changed | BaselineTrend::Decreased => value < baseline,
            BaselineTrend::Increased => value > baseline,
        }
    }

    fn message(self, label: &str, value: Number, baseline: Number) -> String {
        match self {
            BaselineTrend::Changed => format!(
                "{} : actual value ({}) has changed (was {})",
                label, value, baseline
            ),
            BaselineTrend::Decreased => format!(
                "{} : actual value ({}) is less than the reference value ({})",
                label, value, baseline
            ),
            BaselineTrend::Increased => format!(
                "{} : actual value ({}) is more than the reference value ({})",
                label, value, baseline
            ),
        }
    }
}

impl fmt::Display for BaselineTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaselineTrend {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "changed" => Ok(BaselineTrend::Changed),
            "decreased" => Ok(BaselineTrend::Decreased),
            "increased" => Ok(BaselineTrend::Increased),
            other => Err(VigilError::Config(format!(
                "Unknown baseline trend '{}' (expected changed, decreased or increased)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for BaselineTrend {
    type Error = VigilError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The Gauge evaluates observations and files the outcome in a report.
///
/// The report is passed in by the caller; the Gauge keeps no state. The
/// baseline policy also takes the store holding the host's baselines.
pub struct Gauge;

impl Gauge {
    /// Compare a reading against absolute bounds.
    ///
    /// Bounds are tested in the order `crit_min`, `warn_min`, `crit_max`,
    /// `warn_max`; the first match files its message and the rest are
    /// skipped. Text readings are compared through
    /// [`Reading::magnitude`].
    pub fn evaluate_threshold(
        report: &mut StatusReport,
        id: &str,
        label: &str,
        reading: &Reading,
        thresholds: &Thresholds,
    ) {
        report.add_more(format!("{} : {}", label, reading));
        tracing::debug!("Gauge id={}, value={} ({})", id, reading, thresholds);

        if let Some(value) = reading.magnitude() {
            Self::classify(report, label, value, thresholds, |b| b);
        }
    }

    /// Like [`evaluate_threshold`](Self::evaluate_threshold), but every
    /// bound is a factor applied to the value itself: the `crit_min` test
    /// becomes `value <= value * crit_min`.
    pub fn evaluate_factor(
        report: &mut StatusReport,
        id: &str,
        label: &str,
        reading: &Reading,
        factors: &Thresholds,
    ) {
        report.add_more(format!("{} : {}", label, reading));
        tracing::debug!("Gauge id={}, value={} ({})", id, reading, factors);

        if let Some(value) = reading.magnitude() {
            Self::classify(report, label, value, factors, |factor| value.scaled(factor));
        }
    }

    /// [`evaluate_threshold`](Self::evaluate_threshold) every
    /// `(label, reading)` pair, with ids `<id_prefix>0`, `<id_prefix>1`, …
    pub fn evaluate_list_threshold(
        report: &mut StatusReport,
        id_prefix: &str,
        pairs: &[(String, Reading)],
        thresholds: &Thresholds,
    ) {
        for (index, (label, reading)) in pairs.iter().enumerate() {
            let id = format!("{}{}", id_prefix, index);
            Self::evaluate_threshold(report, &id, label, reading, thresholds);
        }
    }

    /// [`evaluate_factor`](Self::evaluate_factor) every `(label, reading)`
    /// pair, with ids `<id_prefix>0`, `<id_prefix>1`, …
    pub fn evaluate_list_factor(
        report: &mut StatusReport,
        id_prefix: &str,
        pairs: &[(String, Reading)],
        factors: &Thresholds,
    ) {
        for (index, (label, reading)) in pairs.iter().enumerate() {
            let id = format!("{}{}", id_prefix, index);
            Self::evaluate_factor(report, &id, label, reading, factors);
        }
    }

    /// Compare a reading against the baseline of the previous run.
    ///
    /// When a baseline exists and the value moved in the `trend` direction,
    /// a message is filed under `level`. A numeric value is then always
    /// stored as the new baseline, alert or not. Text readings are only
    /// recorded.
    ///
    /// Store failures are logged and treated as a missing baseline.
    pub fn evaluate_against_baseline<S: BaselineStore + ?Sized>(
        report: &mut StatusReport,
        store: &mut S,
        id: &str,
        label: &str,
        reading: &Reading,
        level: Severity,
        trend: BaselineTrend,
    ) {
        report.add_more(format!("{} : {}", label, reading));
        let key = baseline_key(id);
        let baseline = store.get(&key).unwrap_or_else(|e| {
            tracing::warn!("Cannot read baseline '{}': {}", key, e);
            None
        });
        tracing::debug!(
            "Gauge id={}, was:{}, now:{}",
            id,
            bound(baseline),
            reading
        );

        let Some(value) = reading.number() else {
            return;
        };
        if let Some(baseline) = baseline {
            report.add_if(
                trend.fires(value, baseline),
                level,
                trend.message(label, value, baseline),
            );
        }
        if let Err(e) = store.set(&key, value) {
            tracing::warn!("Cannot store baseline '{}': {}", key, e);
        }
    }

    /// File the message of the first matching bound. `limit` turns a
    /// configured bound into the value compared against.
    fn classify(
        report: &mut StatusReport,
        label: &str,
        value: Number,
        bounds: &Thresholds,
        limit: impl Fn(Number) -> Number,
    ) {
        let checks = [
            (bounds.crit_min, Severity::Critical, "<= MIN CRITICAL", true),
            (bounds.warn_min, Severity::Warning, "<= MIN WARNING", true),
            (bounds.crit_max, Severity::Critical, ">= MAX CRITICAL", false),
            (bounds.warn_max, Severity::Warning, ">= MAX WARNING", false),
        ];

        report.add_first_match(checks.into_iter().filter_map(
            |(configured, level, wording, is_min)| {
                let limit = limit(configured?);
                let crossed = if is_min { value <= limit } else { value >= limit };
                Some((
                    crossed,
                    level,
                    format!("{} : {} {} ({})", label, value, wording, limit),
                ))
            },
        ));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn max_bounds(warn: i64, crit: i64) -> Thresholds {
        Thresholds {
            warn_max: Some(Number::Int(warn)),
            crit_max: Some(Number::Int(crit)),
            ..Thresholds::default()
        }
    }

    #[test]
    fn text_reading_crosses_warn_max() {
        let mut report = StatusReport::new(Severity::Ok);
        Gauge::evaluate_threshold(
            &mut report,
            "temp",
            "Temp",
            &Reading::from("85 C"),
            &max_bounds(80, 90),
        );

        assert_eq!(report.more_messages(), ["Temp : 85 C"]);
        assert_eq!(
            report.messages(Severity::Warning),
            ["Temp : 85.0 >= MAX WARNING (80)"]
        );
        assert!(report.messages(Severity::Critical).is_empty());
        assert_eq!(report.level(), Some(Severity::Warning));
    }

    #[test]
    fn crit_min_wins_over_warn_min() {
        let mut report = StatusReport::new(Severity::Ok);
        let bounds = Thresholds {
            warn_min: Some(Number::Int(20)),
            crit_min: Some(Number::Int(10)),
            ..Thresholds::default()
        };
        Gauge::evaluate_threshold(&mut report, "fan", "Fan", &Reading::from(5_i64), &bounds);

        assert_eq!(
            report.messages(Severity::Critical),
            ["Fan : 5 <= MIN CRITICAL (10)"]
        );
        assert!(report.messages(Severity::Warning).is_empty());
    }

    #[test]
    fn non_numeric_reading_only_recorded() {
        let mut report = StatusReport::new(Severity::Ok);
        Gauge::evaluate_threshold(
            &mut report,
            "psu",
            "PSU",
            &Reading::from("absent"),
            &max_bounds(1, 2),
        );

        assert_eq!(report.more_messages(), ["PSU : absent"]);
        assert_eq!(report.level(), None);
    }

    #[test]
    fn no_bounds_means_no_message() {
        let mut report = StatusReport::new(Severity::Ok);
        Gauge::evaluate_threshold(
            &mut report,
            "load",
            "Load",
            &Reading::from(1e9_f64),
            &Thresholds::default(),
        );
        assert_eq!(report.more_messages().len(), 1);
        assert_eq!(report.level(), None);
    }

    #[test]
    fn factor_bound_scales_the_value_itself() {
        // value <= value * 2 holds for any positive value
        let mut report = StatusReport::new(Severity::Ok);
        let factors = Thresholds {
            warn_min: Some(Number::Int(2)),
            ..Thresholds::default()
        };
        Gauge::evaluate_factor(&mut report, "io", "IO", &Reading::from(10_i64), &factors);
        assert_eq!(
            report.messages(Severity::Warning),
            ["IO : 10 <= MIN WARNING (20)"]
        );

        // value >= value * 0.5 also holds
        let mut report = StatusReport::new(Severity::Ok);
        let factors = Thresholds {
            crit_max: Some(Number::Float(0.5)),
            ..Thresholds::default()
        };
        Gauge::evaluate_factor(&mut report, "io", "IO", &Reading::from(10_i64), &factors);
        assert_eq!(
            report.messages(Severity::Critical),
            ["IO : 10 >= MAX CRITICAL (5.0)"]
        );
    }

    #[test]
    fn list_evaluates_every_pair() {
        let mut report = StatusReport::new(Severity::Ok);
        let pairs = vec![
            ("Fan 1".to_string(), Reading::from(3000_i64)),
            ("Fan 2".to_string(), Reading::from(9000_i64)),
        ];
        Gauge::evaluate_list_threshold(&mut report, "fan", &pairs, &max_bounds(5000, 10000));

        assert_eq!(report.more_messages(), ["Fan 1 : 3000", "Fan 2 : 9000"]);
        assert_eq!(
            report.messages(Severity::Warning),
            ["Fan 2 : 9000 >= MAX WARNING (5000)"]
        );
    }

    #[test]
    fn baseline_tracks_latest_value() {
        let mut report = StatusReport::new(Severity::Ok);
        let mut store = MemoryStore::new();
        let disk = |report: &mut StatusReport, store: &mut MemoryStore, v: f64| {
            Gauge::evaluate_against_baseline(
                report,
                store,
                "disk",
                "Disk free",
                &Reading::from(v),
                Severity::Critical,
                BaselineTrend::Decreased,
            );
        };

        disk(&mut report, &mut store, 42.0);
        assert_eq!(report.level(), None);
        assert_eq!(store.get("disk_etalon").expect("get"), Some(Number::Float(42.0)));

        disk(&mut report, &mut store, 30.0);
        assert_eq!(
            report.messages(Severity::Critical),
            ["Disk free : actual value (30.0) is less than the reference value (42.0)"]
        );
        assert_eq!(store.get("disk_etalon").expect("get"), Some(Number::Float(30.0)));
    }

    #[test]
    fn baseline_wording_per_trend() {
        let cases = [
            (BaselineTrend::Changed, 5_i64, "Mem : actual value (5) has changed (was 8)"),
            (
                BaselineTrend::Increased,
                9,
                "Mem : actual value (9) is more than the reference value (8)",
            ),
        ];
        for (trend, value, expected) in cases {
            let mut report = StatusReport::new(Severity::Ok);
            let mut store: MemoryStore = [("mem_etalon".to_string(), Number::Int(8))]
                .into_iter()
                .collect();
            Gauge::evaluate_against_baseline(
                &mut report,
                &mut store,
                "mem",
                "Mem",
                &Reading::from(value),
                Severity::Warning,
                trend,
            );
            assert_eq!(report.messages(Severity::Warning), [expected]);
        }
    }

    #[test]
    fn changed_ignores_increase() {
        let mut report = StatusReport::new(Severity::Ok);
        let mut store: MemoryStore = [("mem_etalon".to_string(), Number::Int(8))]
            .into_iter()
            .collect();
        Gauge::evaluate_against_baseline(
            &mut report,
            &mut store,
            "mem",
            "Mem",
            &Reading::from(12_i64),
            Severity::Warning,
            BaselineTrend::Changed,
        );
        assert_eq!(report.level(), None);
        assert_eq!(store.get("mem_etalon").expect("get"), Some(Number::Int(12)));
    }

    #[test]
    fn text_reading_leaves_baseline_alone() {
        let mut report = StatusReport::new(Severity::Ok);
        let mut store: MemoryStore = [("mem_etalon".to_string(), Number::Int(8))]
            .into_iter()
            .collect();
        Gauge::evaluate_against_baseline(
            &mut report,
            &mut store,
            "mem",
            "Mem",
            &Reading::from("2 GB"),
            Severity::Warning,
            BaselineTrend::Decreased,
        );
        assert_eq!(report.more_messages(), ["Mem : 2 GB"]);
        assert_eq!(store.get("mem_etalon").expect("get"), Some(Number::Int(8)));
    }

    #[test]
    fn trend_parsing() {
        assert_eq!("Decreased".parse::<BaselineTrend>().ok(), Some(BaselineTrend::Decreased));
        assert!(matches!(
            "sideways".parse::<BaselineTrend>(),
            Err(VigilError::Config(_))
        ));
    }
}
