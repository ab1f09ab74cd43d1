//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production, stderr in simulation).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { loaded, reset } => {
                info!("BOOT  | records loaded={} reset={}", loaded, reset);
            }
            AppEvent::RecordReset { name, outcome } => {
                warn!("RECORD| '{}' reset to defaults ({:?})", name, outcome);
            }
            AppEvent::RecordsPersisted(count) => {
                info!("RECORD| {} written back", count);
            }
            AppEvent::PersistFailed => {
                warn!("RECORD| write-back failed, will retry");
            }
            AppEvent::ScheduleChanged { entries } => {
                info!("SCHED | rebuilt, {} entries", entries);
            }
            AppEvent::FactoryReset => {
                warn!("RESET | factory defaults restored");
            }
        }
    }
}
