//! # vigil
//!
//! The check runner around vigil-core - THE BINARY's library half.
//!
//! - `cli`: clap commands and their implementations
//! - `config`: check definitions (TOML) and observations (JSON)
//! - `check`: gauge orchestration and the error response
//! - `host`: which host a run is about
//! - `logging`: tracing subscriber setup

pub mod check;
pub mod cli;
pub mod config;
pub mod host;
pub mod logging;
