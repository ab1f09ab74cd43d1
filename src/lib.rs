//! PetFeeder firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection:
//!
//! - [`record`]: checksummed configuration records and the record chain
//! - [`planner`]: weekday-indexed feed planner
//! - [`app`]: boot/recovery flow and next-feeding arithmetic behind port traits
//! - [`adapters`]: NVS storage, log sink, wall clock
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod planner;
pub mod record;

pub use error::{Error, Result};
