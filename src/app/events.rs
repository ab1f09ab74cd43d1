//! Outbound application events.
//!
//! The [`FeederService`](super::service::FeederService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, refresh a display,
//! push to a companion app, etc.

use crate::planner::PlannerEntry;
use crate::record::LoadOutcome;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished: how many records were loaded intact and how many
    /// fell back to defaults.
    Booted { loaded: usize, reset: usize },

    /// A record was replaced by its defaults.
    RecordReset {
        name: &'static str,
        outcome: LoadOutcome,
    },

    /// Dirty records were written back.
    RecordsPersisted(usize),

    /// Writing records back failed; they stay dirty for the next attempt.
    PersistFailed,

    /// The planner was rebuilt from the feed record.
    ScheduleChanged { entries: usize },

    /// Every record was reset on request.
    FactoryReset,
}

/// The next feeding as seen from some reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingFeed {
    pub entry: PlannerEntry,
    /// Seconds from the reference instant until `entry`.
    pub secs_until: u32,
}
