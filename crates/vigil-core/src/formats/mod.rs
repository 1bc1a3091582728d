//! # Formats Module
//!
//! Serialization formats for persisted host data.

mod persistence;

pub use persistence::*;
