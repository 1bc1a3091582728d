//! # Output Primitives
//!
//! Fixed layout and naming constants of the check output.
//!
//! These are part of the output protocol read by the monitoring server and
//! by the people looking at it. They are compiled in and never configured.

/// Maximum number of characters of the synopsis line.
///
/// Longer synopses are cut and marked with [`TRUNCATION_MARK`].
pub const SYNOPSIS_MAX_CHARS: usize = 75;

/// Appended to a synopsis that was cut.
pub const TRUNCATION_MARK: &str = "...";

/// Width of section banners in the report body.
pub const BANNER_WIDTH: usize = 80;

/// Width of the title field inside a section banner.
pub const BANNER_TITLE_WIDTH: usize = 8;

/// Separates human-readable text from performance data.
///
/// Reserved: it never appears unescaped in the synopsis or the body.
pub const PERF_DELIMITER: char = '|';

/// Replaces [`PERF_DELIMITER`] inside human-readable text.
pub const PERF_ESCAPE: char = '!';

/// Suffix of the store key holding a gauge's baseline.
pub const BASELINE_KEY_SUFFIX: &str = "_etalon";

/// Highest documented sublevel.
///
/// | Sublevel | Meaning                                              |
/// |----------|------------------------------------------------------|
/// | 0        | the check is sure there is a critical error          |
/// | 1        | the host answered but the agent did not              |
/// | 2        | the host could not be contacted                      |
/// | 3        | the check itself failed unexpectedly                 |
pub const MAX_SUBLEVEL: u8 = 3;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of a persisted per-host store file (16 MB).
///
/// Checked before the file is parsed.
pub const MAX_STORE_FILE_SIZE: usize = 16 * 1024 * 1024;

/// Current version of the per-host store file layout.
pub const STORE_FORMAT_VERSION: u32 = 1;
