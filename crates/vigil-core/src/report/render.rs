//! # Report Rendering
//!
//! Text layout of a check output:
//!
//! ```text
//! <synopsis>|<first perf item>            (or <synopsis>\n without perf data)
//! <begin notes>
//! ==================================[  STATUS  ]==================================
//!
//! ----( CRITICAL )----------------------------------------------------------------
//! <critical messages>
//!
//! ===========================[ Additional information ]===========================
//! <more notes><end notes>|<remaining perf items>
//! ```
//!
//! `|` separates text from performance data, so it is replaced by `!` in the
//! synopsis and in the body, exactly once each.

use super::StatusReport;
use crate::primitives::{
    BANNER_TITLE_WIDTH, BANNER_WIDTH, PERF_DELIMITER, PERF_ESCAPE, SYNOPSIS_MAX_CHARS,
    TRUNCATION_MARK,
};
use crate::Severity;

const STATUS_TITLE: &str = "STATUS";
const MORE_TITLE: &str = "Additional information";

/// Characters that end the synopsis line.
const LINE_BREAKS: [char; 4] = ['\n', '\r', '\x0b', '\x0c'];

/// Section banner: the title in brackets, centered in `=` over the full width.
#[must_use]
pub fn section_banner(title: &str) -> String {
    let bracketed = format!("[ {:^width$} ]", title, width = BANNER_TITLE_WIDTH);
    format!("{:=^width$}", bracketed, width = BANNER_WIDTH)
}

/// Subsection banner: `----( TITLE )` padded with `-` to the full width.
#[must_use]
pub fn subsection_banner(title: &str) -> String {
    let label = format!("( {} )", title);
    format!("----{:-<width$}", label, width = BANNER_WIDTH - 4)
}

/// Replace the performance data delimiter in human-readable text.
#[must_use]
pub fn escape(text: &str) -> String {
    text.replace(PERF_DELIMITER, &PERF_ESCAPE.to_string())
}

/// Cut `text` to the synopsis length, marking the cut.
#[must_use]
pub fn truncate_synopsis(text: &str) -> String {
    match text.char_indices().nth(SYNOPSIS_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARK),
        None => text.to_string(),
    }
}

impl StatusReport {
    /// Render the full check output.
    ///
    /// Pure: rendering twice gives the same text and changes nothing.
    #[must_use]
    pub fn render(&self) -> String {
        let synopsis = self
            .synopsis()
            .map_or_else(|| self.default_synopsis(), str::to_string);
        let first_line = synopsis.split(LINE_BREAKS).next().unwrap_or_default();

        let mut out = escape(&truncate_synopsis(first_line));
        match self.performance.first() {
            Some(item) => {
                out.push(PERF_DELIMITER);
                out.push_str(item);
            }
            None => out.push('\n'),
        }

        let mut body = self.begin.join("\n");
        body.push_str(&self.render_status());
        if !self.more.is_empty() {
            body.push_str(&section_banner(MORE_TITLE));
            body.push('\n');
            body.push_str(&self.more.join("\n"));
        }
        body.push_str(&self.end.join("\n"));
        out.push_str(&escape(&body));

        if let Some(rest) = self.performance.get(1..).filter(|rest| !rest.is_empty()) {
            out.push(PERF_DELIMITER);
            out.push_str(&rest.join("\n"));
        }
        out
    }

    /// The STATUS section, empty when no bucket holds a message.
    fn render_status(&self) -> String {
        let filled: Vec<Severity> = Severity::REPORT_ORDER
            .into_iter()
            .filter(|level| !self.messages(*level).is_empty())
            .collect();
        if filled.is_empty() {
            return String::new();
        }

        let mut out = section_banner(STATUS_TITLE);
        out.push('\n');
        for level in filled {
            out.push('\n');
            out.push_str(&subsection_banner(level.name()));
            out.push('\n');
            out.push_str(&self.messages(level).join("\n"));
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================
