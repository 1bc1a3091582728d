//! # vigil-core
//!
//! The status engine of a monitoring check - THE LOGIC.
//!
//! A check run feeds observations to the [`Gauge`], which classifies them
//! into a shared [`StatusReport`]. The report merges every classification
//! into one overall [`Severity`] and renders the text a monitoring
//! scheduler expects: a synopsis line, the detailed sections, and the
//! performance data after the `|` separator.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is synchronous: one check run owns one report, nothing is shared
//! - Never exits the process; the binary prints the [`Verdict`] and exits
//! - Touches one external resource: the per-host [`BaselineStore`]
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod gauge;
pub mod primitives;
pub mod report;
pub mod session;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Number, Reading, Severity, VigilError};

// =============================================================================
// RE-EXPORTS: Status Engine
// =============================================================================

pub use gauge::{BaselineTrend, Gauge, Thresholds};
pub use report::{Conclusion, StatusReport, Verdict, section_banner, subsection_banner};
pub use session::{HostSession, StorageBackend};
pub use store::{BaselineStore, MemoryStore, RedbStore, baseline_key};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{store_file_name, store_from_json, store_to_json};
