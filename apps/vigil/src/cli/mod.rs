//! # Vigil CLI Module
//!
//! This module implements the CLI interface for Vigil.
//!
//! ## Available Commands
//!
//! - `check` - Run a check and exit with its severity
//! - `baseline list` - Show the persisted baselines of a host
//! - `baseline set` - Overwrite the baseline of a gauge
//! - `baseline delete` - Forget the baseline of a gauge

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vigil_core::{Verdict, VigilError};

pub use commands::*;

/// Default directory of the persisted baselines.
pub const DEFAULT_STORE_DIR: &str = "/tmp/vigil";

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Vigil - monitoring check runner
///
/// Evaluates collected observations against a check definition, prints a
/// Nagios-compatible report and exits with the severity code.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose mode: log at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode: log at debug level
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Log into this file instead of stderr
    #[arg(short = 'l', long, global = true)]
    pub logfile: Option<PathBuf>,

    /// Name of the monitored host (default: $NAGIOS_HOSTNAME)
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Address of the monitored host (default: $NAGIOS_HOSTADDRESS)
    #[arg(long, global = true)]
    pub ip: Option<String>,

    /// Directory of the persisted baselines
    #[arg(short = 'D', long, global = true, default_value = DEFAULT_STORE_DIR)]
    pub store_dir: PathBuf,

    /// Storage backend: "file" (JSON per host), "redb" (ACID database) or "memory"
    #[arg(short = 'B', long, global = true, default_value = "file")]
    pub backend: String,

    /// Output in JSON format (baseline commands)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a check
    Check {
        /// Check definition (TOML)
        #[arg(short = 'c', long)]
        definition: PathBuf,

        /// Collected observations (JSON)
        #[arg(short = 'o', long)]
        observations: Option<PathBuf>,

        /// Print the check description and exit
        #[arg(long)]
        describe: bool,
    },

    /// Inspect or edit the persisted baselines of the host
    Baseline {
        #[command(subcommand)]
        action: BaselineAction,
    },
}

/// Baseline maintenance.
#[derive(Subcommand, Debug)]
pub enum BaselineAction {
    /// List every stored baseline
    List,

    /// Overwrite the baseline of a gauge
    Set {
        /// Gauge id
        gauge_id: String,

        /// New baseline value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Forget the baseline of a gauge
    Delete {
        /// Gauge id
        gauge_id: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// `check` always yields a verdict, even for a failed run; the caller
/// prints it and exits with its code. Baseline commands yield nothing.
pub fn execute(cli: Cli) -> Result<Option<Verdict>, VigilError> {
    let target = Target {
        name: cli.name,
        ip: cli.ip,
        store_dir: cli.store_dir,
        backend: cli.backend,
    };
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Check {
            definition,
            observations,
            describe,
        } => Ok(Some(cmd_check(
            &target,
            &definition,
            observations.as_deref(),
            describe,
        ))),
        Commands::Baseline { action } => {
            match action {
                BaselineAction::List => cmd_baseline_list(&target, json_mode)?,
                BaselineAction::Set { gauge_id, value } => {
                    cmd_baseline_set(&target, json_mode, &gauge_id, &value)?;
                }
                BaselineAction::Delete { gauge_id } => {
                    cmd_baseline_delete(&target, json_mode, &gauge_id)?;
                }
            }
            Ok(None)
        }
    }
}
