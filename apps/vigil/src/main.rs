//! # Vigil - monitoring check runner
//!
//! The main binary of the Vigil check engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  apps/vigil (THE BINARY)                  │
//! │                                                           │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────────┐   │
//! │  │    CLI      │   │ Check config │   │  Host store   │   │
//! │  │   (clap)    │   │ (TOML, JSON) │   │ (file, redb)  │   │
//! │  └──────┬──────┘   └──────┬───────┘   └───────┬───────┘   │
//! │         └─────────────────┼───────────────────┘           │
//! │                           ▼                               │
//! │                   ┌───────────────┐                       │
//! │                   │  vigil-core   │                       │
//! │                   │  (THE LOGIC)  │                       │
//! │                   └───────────────┘                       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run a check, exit code is the severity
//! vigil --name web01 check -c room.toml -o observations.json
//!
//! # Baseline maintenance
//! vigil --name web01 baseline list
//! vigil --name web01 baseline set disk 42.0
//! ```

use clap::Parser;
use std::io::Write;
use vigil::{cli, logging};
use vigil_core::Verdict;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.debug, cli.logfile.as_deref()) {
        eprintln!("Logging disabled: {}", e);
    }

    match cli::execute(cli) {
        Ok(Some(verdict)) => send(&verdict),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the report and exit with the severity code.
fn send(verdict: &Verdict) -> ! {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", verdict.output);
    let _ = stdout.flush();
    std::process::exit(verdict.exit_code())
}
