//! # Status Report
//!
//! The single mutable aggregate of one check run.
//!
//! A report collects messages into five sections and tracks one overall
//! severity:
//!
//! - *begin*: notes shown first (title, introduction)
//! - *by severity*: one bucket per [`Severity`], rendered CRITICAL, WARNING,
//!   UNKNOWN, OK
//! - *more*: additional information (every gauge reading lands here)
//! - *end*: closing notes
//!
//! Buckets are append-only. The overall severity depends only on the
//! sequence of [`StatusReport::set_level`] calls, never on bucket contents.
//!
//! A report is consumed by [`StatusReport::conclude`], which renders it and
//! yields the [`Verdict`] the caller prints before exiting.

mod render;

pub use render::{escape, section_banner, subsection_banner, truncate_synopsis};

use crate::{Severity, VigilError};
use std::fmt;

/// Accumulated messages and severity of one check run.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Overall severity, unset until a message or level is recorded.
    level: Option<Severity>,
    /// Severity reported when nothing ever set one.
    default_level: Severity,
    /// Refinement of the cause of a CRITICAL result (0-3).
    sublevel: u8,
    /// Explicit synopsis; computed from the buckets when absent.
    synopsis: Option<String>,
    begin: Vec<String>,
    /// Indexed by exit code: OK, WARNING, CRITICAL, UNKNOWN.
    by_severity: [Vec<String>; 4],
    more: Vec<String>,
    end: Vec<String>,
    performance: Vec<String>,
}

impl StatusReport {
    /// Create an empty report.
    ///
    /// `default_level` is what gets reported when no message or level is
    /// ever recorded, usually OK or UNKNOWN.
    #[must_use]
    pub fn new(default_level: Severity) -> Self {
        Self {
            level: None,
            default_level,
            sublevel: 0,
            synopsis: None,
            begin: Vec::new(),
            by_severity: Default::default(),
            more: Vec::new(),
            end: Vec::new(),
            performance: Vec::new(),
        }
    }

    // =========================================================================
    // LEVEL
    // =========================================================================

    /// Merge a severity into the overall one (see [`Severity::merge`]).
    pub fn set_level(&mut self, level: Severity) {
        self.level = Some(Severity::merge(self.level, level));
    }

    /// Overwrite the overall severity, bypassing the merge rules.
    ///
    /// Only for the fast error response, where the check gives up and
    /// reports a fixed level.
    pub fn force_level(&mut self, level: Severity) {
        self.level = Some(level);
    }

    /// The overall severity, `None` while unset.
    #[must_use]
    pub fn level(&self) -> Option<Severity> {
        self.level
    }

    /// The severity that would be sent now.
    #[must_use]
    pub fn current_level(&self) -> Severity {
        self.level.unwrap_or(self.default_level)
    }

    /// Set the sublevel. Not interpreted by the report itself.
    pub fn set_sublevel(&mut self, sublevel: u8) {
        self.sublevel = sublevel;
    }

    #[must_use]
    pub fn sublevel(&self) -> u8 {
        self.sublevel
    }

    // =========================================================================
    // SEVERITY MESSAGES
    // =========================================================================

    /// File a message under `level` and merge `level` into the overall severity.
    pub fn add(&mut self, level: Severity, message: impl Into<String>) {
        self.by_severity[level.index()].push(message.into());
        self.set_level(level);
    }

    /// [`add`](Self::add) only when `condition` holds.
    pub fn add_if(&mut self, condition: bool, level: Severity, message: impl Into<String>) {
        if condition {
            self.add(level, message);
        }
    }

    /// Add the message of the first entry whose condition holds, like an
    /// `if / else if` chain. Returns whether an entry matched.
    pub fn add_first_match<I, M>(&mut self, entries: I) -> bool
    where
        I: IntoIterator<Item = (bool, Severity, M)>,
        M: Into<String>,
    {
        for (condition, level, message) in entries {
            if condition {
                self.add(level, message);
                return true;
            }
        }
        false
    }

    /// Add every non-empty message under the same level.
    pub fn add_list<I, M>(&mut self, level: Severity, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        for message in messages {
            let message = message.into();
            if !message.is_empty() {
                self.add(level, message);
            }
        }
    }

    /// Add each `(level, message)` pair in order.
    pub fn add_many<I, M>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Severity, M)>,
        M: Into<String>,
    {
        for (level, message) in entries {
            self.add(level, message);
        }
    }

    /// Messages filed under `level`, in insertion order.
    #[must_use]
    pub fn messages(&self, level: Severity) -> &[String] {
        &self.by_severity[level.index()]
    }

    // =========================================================================
    // OTHER SECTIONS
    // =========================================================================

    /// Append a note to the begin section. Never affects the severity.
    pub fn add_begin(&mut self, message: impl Into<String>) {
        self.begin.push(message.into());
    }

    /// Append a note to the additional information section.
    pub fn add_more(&mut self, message: impl Into<String>) {
        self.more.push(message.into());
    }

    /// Append a note to the end section.
    pub fn add_end(&mut self, message: impl Into<String>) {
        self.end.push(message.into());
    }

    /// Append an opaque performance data token.
    pub fn add_performance_item(&mut self, item: impl Into<String>) {
        self.performance.push(item.into());
    }

    #[must_use]
    pub fn begin_messages(&self) -> &[String] {
        &self.begin
    }

    #[must_use]
    pub fn more_messages(&self) -> &[String] {
        &self.more
    }

    #[must_use]
    pub fn end_messages(&self) -> &[String] {
        &self.end
    }

    #[must_use]
    pub fn performance_items(&self) -> &[String] {
        &self.performance
    }

    // =========================================================================
    // SYNOPSIS
    // =========================================================================

    /// Override the computed synopsis. Only its first line is ever shown.
    pub fn set_synopsis(&mut self, synopsis: impl Into<String>) {
        self.synopsis = Some(synopsis.into());
    }

    /// The explicit synopsis, if one was set and is not empty.
    #[must_use]
    pub fn synopsis(&self) -> Option<&str> {
        self.synopsis.as_deref().filter(|s| !s.is_empty())
    }

    /// Synopsis computed from the severity buckets.
    ///
    /// - no message at all: the name of the current severity
    /// - only OK messages: `OK`
    /// - exactly one non-OK message: that message, truncated
    /// - otherwise: `STATUS : CRITICAL:2, WARNING:1`, counting each
    ///   non-empty bucket in report order
    #[must_use]
    pub fn default_synopsis(&self) -> String {
        let ok = self.messages(Severity::Ok).len();
        let not_ok: Vec<&String> = [Severity::Warning, Severity::Critical, Severity::Unknown]
            .iter()
            .flat_map(|level| self.messages(*level))
            .collect();

        if ok + not_ok.len() == 0 {
            return self.current_level().name().to_string();
        }
        if ok > 0 && not_ok.is_empty() {
            return Severity::Ok.name().to_string();
        }
        if let [single] = not_ok.as_slice() {
            return truncate_synopsis(single);
        }

        let counts: Vec<String> = Severity::REPORT_ORDER
            .iter()
            .filter(|level| !self.messages(**level).is_empty())
            .map(|level| format!("{}:{}", level, self.messages(*level).len()))
            .collect();
        format!("STATUS : {}", counts.join(", "))
    }

    // =========================================================================
    // CONCLUSION
    // =========================================================================

    /// Apply the last-minute settings of `conclusion`, fix the severity and
    /// render the report.
    ///
    /// An unset severity becomes the default one. An extra message needs a
    /// level to be filed under, otherwise `VigilError::MissingSeverity`.
    pub fn conclude(mut self, conclusion: Conclusion) -> Result<Verdict, VigilError> {
        let Conclusion {
            level,
            synopsis,
            message,
            sublevel,
        } = conclusion;
        let message = message.filter(|m| !m.is_empty());
        if message.is_some() && level.is_none() {
            return Err(VigilError::MissingSeverity);
        }

        if let Some(level) = level {
            self.set_level(level);
        }
        let severity = self.current_level();
        self.level = Some(severity);
        if let Some(synopsis) = synopsis.filter(|s| !s.is_empty()) {
            self.synopsis = Some(synopsis);
        }
        if let (Some(level), Some(message)) = (level, message) {
            self.add(level, message);
        }
        if let Some(sublevel) = sublevel {
            self.set_sublevel(sublevel);
        }

        tracing::info!(
            "Plugin output summary : {}",
            self.synopsis().map_or_else(|| self.default_synopsis(), str::to_string)
        );
        let output = self.render();
        tracing::debug!("Plugin output :\n{}", output);
        tracing::info!(
            "Exiting plugin with response level : {}, __sublevel__={}",
            severity.info(),
            self.sublevel
        );

        Ok(Verdict {
            output,
            severity,
            sublevel: self.sublevel,
        })
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Last-minute settings applied when a report is concluded.
#[derive(Debug, Clone, Default)]
pub struct Conclusion {
    /// Merged into the overall severity before it is fixed.
    pub level: Option<Severity>,
    /// Replaces the synopsis when not empty.
    pub synopsis: Option<String>,
    /// Filed under `level` when not empty.
    pub message: Option<String>,
    pub sublevel: Option<u8>,
}

/// The rendered outcome of a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Text to print on standard output.
    pub output: String,
    pub severity: Severity,
    pub sublevel: u8,
}

impl Verdict {
    /// Process exit code of the verdict.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.severity.exit_code()
    }
}

// =============================================================================
// TESTS
// =============================================================================
