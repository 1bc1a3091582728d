//! # Logging Setup
//!
//! stdout carries the check output and nothing else, so logs go to stderr
//! or to the file given with `-l`.
//!
//! - `VIGIL_LOG` takes an `EnvFilter` directive and overrides `-v`/`-d`
//! - `VIGIL_LOG_FORMAT=json` switches to one JSON object per line

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vigil_core::VigilError;

/// Filter directive variable.
pub const LOG_ENV: &str = "VIGIL_LOG";

/// Output format variable (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "VIGIL_LOG_FORMAT";

/// Level used when `VIGIL_LOG` is not set.
pub fn default_directive(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "error"
    }
}

/// Install the global subscriber.
pub fn init(verbose: bool, debug: bool, logfile: Option<&Path>) -> Result<(), VigilError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, debug)));

    let writer = match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    VigilError::Io(format!("Cannot open log file '{}': {}", path.display(), e))
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "text".to_string());
    let result = match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(logfile.is_none())
                    .with_writer(writer),
            )
            .try_init(),
    };

    result.map_err(|e| VigilError::Config(format!("Cannot initialize logging: {}", e)))
}
