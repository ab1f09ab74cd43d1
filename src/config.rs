//! System configuration parameters
//!
//! Application-level tunables for the PetFeeder core.  Device settings the
//! user edits (network, feeding times) live in checksummed records, see
//! [`crate::record`]; this struct only shapes how the core runs.
//! Persisted through [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::planner::PlannerMode;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Planner ---
    /// Weekly (per-weekday slots) or daily (weekday ignored) scheduling
    pub planner_mode: PlannerMode,

    // --- Records ---
    /// Storage namespace holding every record image
    pub record_namespace: heapless::String<15>,
    /// Persist dirty records right after each edit instead of on demand
    pub autosave: bool,

    // --- Timing ---
    /// Main loop tick interval (milliseconds)
    pub tick_interval_ms: u32,
    /// How long the manual button is locked out after a feeding (seconds)
    pub manual_feed_lockout_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut record_namespace = heapless::String::new();
        let _ = record_namespace.push_str("records");
        Self {
            // Planner
            planner_mode: PlannerMode::Weekly,

            // Records
            record_namespace,
            autosave: true,

            // Timing
            tick_interval_ms: 1000,       // 1 Hz
            manual_feed_lockout_secs: 600, // 10 min
        }
    }
}
