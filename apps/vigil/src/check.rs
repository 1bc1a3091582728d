//! # Check Runner
//!
//! Turns a check definition and the observations of one run into a
//! finished [`StatusReport`], and builds the short error response used
//! whenever a run cannot complete.

use crate::config::{CheckDefinition, GaugePolicy, GaugeSpec, Observations, Observed};
use std::time::{Duration, Instant};
use vigil_core::{
    BaselineStore, BaselineTrend, Gauge, Severity, StatusReport, VigilError,
    primitives::MAX_SUBLEVEL, section_banner,
};

/// Sublevel of a run whose observations could not be collected or read.
pub const SUBLEVEL_COLLECT_FAILURE: u8 = 1;

/// Sublevel of an internal error or a missing host parameter.
pub const SUBLEVEL_INTERNAL_ERROR: u8 = MAX_SUBLEVEL;

/// Identity of the running check, shown in the "Plugin Informations"
/// section of every report.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub plugin_name: String,
    pub description: String,
    pub started: Instant,
}

impl CheckContext {
    pub fn new(plugin_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            description: description.into(),
            started: Instant::now(),
        }
    }

    pub fn for_definition(definition: &CheckDefinition) -> Self {
        Self::new(definition.name.clone(), definition.summary())
    }
}

/// Elapsed time as `H:MM:SS.micros`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}

/// The closing section of every report.
///
/// Reports the level and sublevel the report has right now, so it must be
/// the last thing added.
pub fn plugin_informations(report: &StatusReport, ctx: &CheckContext) -> String {
    let level = report.current_level();
    format!(
        "\n{}\nPlugin name : {}\nDescription : {}\nExecution time : {}\nExit code : {} ({}), __sublevel__={}",
        section_banner("Plugin Informations"),
        ctx.plugin_name,
        ctx.description,
        format_elapsed(ctx.started.elapsed()),
        level.exit_code(),
        level.name(),
        report.sublevel()
    )
}

/// Run every gauge of `definition` over `observations`.
///
/// All readings are looked up before anything is evaluated, so a missing
/// one fails the run without touching the store.
pub fn run_check<S: BaselineStore + ?Sized>(
    definition: &CheckDefinition,
    observations: &Observations,
    store: &mut S,
    ctx: &CheckContext,
) -> Result<StatusReport, VigilError> {
    let readings = definition
        .gauges
        .iter()
        .map(|gauge| Ok((gauge, observations.reading(&gauge.id)?)))
        .collect::<Result<Vec<_>, VigilError>>()?;

    let mut report = StatusReport::new(definition.default_level);
    for note in &definition.begin {
        report.add_begin(note.clone());
    }

    for (gauge, observed) in readings {
        evaluate_gauge(&mut report, store, gauge, observed);
    }
    tracing::info!("Evaluated {} gauges", definition.gauges.len());

    for finding in &observations.findings {
        report.add(finding.level, finding.message.clone());
    }
    for note in &observations.notes {
        report.add_more(note.clone());
    }
    for item in &observations.perf {
        report.add_performance_item(item.clone());
    }
    if let Some(synopsis) = &observations.synopsis {
        report.set_synopsis(synopsis.clone());
    }

    for note in &definition.end {
        report.add_end(note.clone());
    }
    let informations = plugin_informations(&report, ctx);
    report.add_end(informations);
    Ok(report)
}

fn evaluate_gauge<S: BaselineStore + ?Sized>(
    report: &mut StatusReport,
    store: &mut S,
    gauge: &GaugeSpec,
    observed: &Observed,
) {
    let baseline = |gauge: &GaugeSpec| -> (Severity, BaselineTrend) {
        // Both set for baseline gauges once CheckDefinition::validate passed
        (
            gauge.level.unwrap_or(Severity::Warning),
            gauge.trend.unwrap_or(BaselineTrend::Changed),
        )
    };

    match (gauge.policy, observed) {
        (GaugePolicy::Threshold, Observed::One(reading)) => {
            Gauge::evaluate_threshold(report, &gauge.id, gauge.label(), reading, &gauge.thresholds);
        }
        (GaugePolicy::Threshold, Observed::Many(pairs)) => {
            Gauge::evaluate_list_threshold(report, &gauge.id, pairs, &gauge.thresholds);
        }
        (GaugePolicy::Factor, Observed::One(reading)) => {
            Gauge::evaluate_factor(report, &gauge.id, gauge.label(), reading, &gauge.thresholds);
        }
        (GaugePolicy::Factor, Observed::Many(pairs)) => {
            Gauge::evaluate_list_factor(report, &gauge.id, pairs, &gauge.thresholds);
        }
        (GaugePolicy::Baseline, Observed::One(reading)) => {
            let (level, trend) = baseline(gauge);
            Gauge::evaluate_against_baseline(
                report,
                store,
                &gauge.id,
                gauge.label(),
                reading,
                level,
                trend,
            );
        }
        (GaugePolicy::Baseline, Observed::Many(pairs)) => {
            let (level, trend) = baseline(gauge);
            for (index, (label, reading)) in pairs.iter().enumerate() {
                let id = format!("{}{}", gauge.id, index);
                Gauge::evaluate_against_baseline(report, store, &id, label, reading, level, trend);
            }
        }
    }
}

/// A report that only states why the run gave up.
///
/// The level is forced, not merged: this is the whole answer of the run.
pub fn fast_response(
    level: Severity,
    synopsis: &str,
    body: &str,
    sublevel: u8,
    ctx: &CheckContext,
) -> StatusReport {
    let mut report = StatusReport::new(level);
    report.force_level(level);
    report.set_sublevel(sublevel);
    report.set_synopsis(synopsis);
    if !body.is_empty() {
        report.add_begin(body);
    }
    let informations = plugin_informations(&report, ctx);
    report.add_end(informations);
    report
}

/// Why a run gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The observations could not be read or lack a reading.
    Collect,
    /// Anything else: bad definition, unusable store, ...
    Internal,
}

impl Failure {
    /// Failure kind of an error raised while running the gauges.
    pub fn of(error: &VigilError) -> Self {
        match error {
            VigilError::MissingReading(_) => Failure::Collect,
            _ => Failure::Internal,
        }
    }
}

/// The error response of a failed run.
///
/// Collection failures have sublevel 1, internal errors and a missing host
/// parameter sublevel 3. For internal errors the `observations`, when
/// already loaded, are dumped in the body.
pub fn error_response(
    level: Severity,
    error: &VigilError,
    failure: Failure,
    observations: Option<&Observations>,
    ctx: &CheckContext,
) -> StatusReport {
    let (synopsis, sublevel) = match (error, failure) {
        (VigilError::MissingHostParameter(_), _) => (error.to_string(), SUBLEVEL_INTERNAL_ERROR),
        (_, Failure::Collect) => (
            format!("Failed to collect equipment status : {}", error),
            SUBLEVEL_COLLECT_FAILURE,
        ),
        (_, Failure::Internal) => (
            format!("Plugin internal error : {}", error),
            SUBLEVEL_INTERNAL_ERROR,
        ),
    };
    tracing::error!("{}", synopsis);

    let body = match (error, observations) {
        (VigilError::MissingHostParameter(_), _) => crate::host::required_fields_message(),
        (_, Some(observations)) if failure == Failure::Internal => {
            serde_json::to_string_pretty(observations)
                .map(|data| format!("Data = \n{}\n\n", data))
                .unwrap_or_default()
        }
        _ => String::new(),
    };
    let level = match error {
        VigilError::MissingHostParameter(_) => Severity::Critical,
        _ => level,
    };
    fast_response(level, &synopsis, &body, sublevel, ctx)
}
