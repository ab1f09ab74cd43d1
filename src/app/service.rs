//! Application service, the hexagonal core.
//!
//! [`FeederService`] owns the record chain and the feed planner.  It runs
//! the boot-time recovery flow, keeps the planner in step with the feed
//! record, and answers "when is the next feeding".  All I/O flows through
//! port traits injected at call sites.
//!
//! ```text
//!  StoragePort ◀─▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │     FeederService      │
//!                  │  RecordChain · Planner │
//!                  └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::Result;
use crate::planner::{Planner, PlannerEntry, PlannerMode, SECS_PER_DAY, Weekday};
use crate::record::{FeedFeatures, FeedRecord, LoadReport, NetworkRecord, RecordChain};

use super::events::{AppEvent, UpcomingFeed};
use super::ports::{EventSink, StoragePort};

/// Largest gap between two clock readings that still counts as time
/// passing rather than the clock being set.
pub const MAX_FEED_CATCH_UP_SECS: u32 = 300;

const SECS_PER_WEEK: u32 = 7 * SECS_PER_DAY;

fn week_secs(entry: PlannerEntry) -> u32 {
    u32::from(entry.weekday.index()) * SECS_PER_DAY + entry.time_of_day
}

// ───────────────────────────────────────────────────────────────
// FeederService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct FeederService {
    records: RecordChain,
    planner: Planner,
    namespace: heapless::String<15>,
    autosave: bool,
    manual_feed_lockout_secs: u32,
}

impl FeederService {
    /// Construct the service with zeroed records and an empty planner.
    ///
    /// Nothing is valid until [`boot`](Self::boot) has run.
    pub fn new(config: &SystemConfig) -> Result<Self> {
        let mut records = RecordChain::new();
        records.push(NetworkRecord::new())?;
        records.push(FeedRecord::new())?;

        Ok(Self {
            records,
            planner: Planner::new(config.planner_mode),
            namespace: config.record_namespace.clone(),
            autosave: config.autosave,
            manual_feed_lockout_secs: config.manual_feed_lockout_secs,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load every record, reset what is missing or corrupt, write the
    /// repaired images back and rebuild the schedule.
    ///
    /// Never fails: a storage failure leaves the service running on
    /// defaults with the affected records still dirty.
    pub fn boot(
        &mut self,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> LoadReport {
        let report = self.records.load_all(&*storage, &self.namespace);

        for (name, outcome) in report.iter().filter(|(_, o)| o.was_reset()) {
            sink.emit(&AppEvent::RecordReset { name, outcome });
        }

        // Already logged and announced by `persist`.
        let _ = self.persist(storage, sink);
        self.rebuild_schedule(sink);

        sink.emit(&AppEvent::Booted {
            loaded: report.loaded_count(),
            reset: report.reset_count(),
        });
        info!(
            "FeederService booted: {} loaded, {} reset, {} schedule entries",
            report.loaded_count(),
            report.reset_count(),
            self.planner.len()
        );
        report
    }

    /// Write every dirty record back to storage.
    pub fn persist(
        &mut self,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        match self.records.save_dirty(storage, &self.namespace) {
            Ok(0) => Ok(0),
            Ok(saved) => {
                sink.emit(&AppEvent::RecordsPersisted(saved));
                Ok(saved)
            }
            Err(e) => {
                warn!("FeederService: persist failed: {}", e);
                sink.emit(&AppEvent::PersistFailed);
                Err(e)
            }
        }
    }

    /// Reset every record to defaults, rebuild the schedule and persist.
    pub fn factory_reset(
        &mut self,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        self.records.reset_all();
        sink.emit(&AppEvent::FactoryReset);
        self.rebuild_schedule(sink);
        self.persist(storage, sink)
    }

    // ── Record edits ──────────────────────────────────────────

    /// Edit the feed record.  If anything changed the planner is rebuilt
    /// (announced as [`AppEvent::ScheduleChanged`]) and, with autosave on,
    /// the record is persisted.
    pub fn update_feed<R>(
        &mut self,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
        edit: impl FnOnce(&mut FeedRecord) -> R,
    ) -> Option<R> {
        let feed = self.records.get_mut::<FeedRecord>()?;
        let before = *feed.as_bytes();
        let out = edit(feed);
        let changed = *feed.as_bytes() != before;

        if changed {
            self.rebuild_schedule(sink);
            self.autosave(storage, sink);
        }
        Some(out)
    }

    /// Edit the network record, persisting with autosave on.
    pub fn update_network<R>(
        &mut self,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
        edit: impl FnOnce(&mut NetworkRecord) -> R,
    ) -> Option<R> {
        let net = self.records.get_mut::<NetworkRecord>()?;
        let before = *net.as_bytes();
        let out = edit(net);
        if *net.as_bytes() != before {
            self.autosave(storage, sink);
        }
        Some(out)
    }

    fn autosave(&mut self, storage: &mut impl StoragePort, sink: &mut impl EventSink) {
        if self.autosave {
            // Failure is logged and announced; records stay dirty.
            let _ = self.persist(storage, sink);
        }
    }

    // ── Schedule ──────────────────────────────────────────────

    /// Repopulate the planner from the feed record's slots.
    ///
    /// The planner stays empty while the `SCHEDULE` feature is off.
    /// Returns the number of entries now stored.
    pub fn rebuild_schedule(&mut self, sink: &mut impl EventSink) -> usize {
        self.planner.delete_all_entries();

        if let Some(feed) = self.records.get::<FeedRecord>() {
            if feed.has_feature(FeedFeatures::SCHEDULE) {
                for slot in feed.slots() {
                    match self.planner.mode() {
                        PlannerMode::Daily => {
                            self.planner
                                .add_entry(PlannerEntry::new(Weekday::Monday, slot.time_of_day));
                        }
                        PlannerMode::Weekly => {
                            for day in Weekday::ALL.into_iter().filter(|d| slot.runs_on(d.index())) {
                                self.planner
                                    .add_entry(PlannerEntry::new(day, slot.time_of_day));
                            }
                        }
                    }
                }
            }
        }

        let entries = self.planner.len();
        sink.emit(&AppEvent::ScheduleChanged { entries });
        info!("FeederService: schedule rebuilt, {} entries", entries);
        entries
    }

    /// The stored feeding time that controls `now` (see
    /// [`Planner::get_next_entry`]).
    pub fn controlling_entry(&self, now: PlannerEntry) -> Option<PlannerEntry> {
        self.planner.get_next_entry(now)
    }

    /// First scheduled feeding strictly after `now`, rolling over midnight
    /// and the week boundary.  `None` when nothing is scheduled.
    pub fn next_feed_after(&self, now: PlannerEntry) -> Option<UpcomingFeed> {
        if !now.is_valid() {
            return None;
        }

        let mut day = now.weekday;
        for offset in 0..=7u32 {
            let entries = self.planner.entries(day);
            let found = if offset == 0 {
                entries.iter().copied().find(|&t| t > now.time_of_day)
            } else {
                entries.first().copied()
            };

            if let Some(time_of_day) = found {
                return Some(UpcomingFeed {
                    entry: PlannerEntry::new(day, time_of_day),
                    secs_until: offset * SECS_PER_DAY + time_of_day - now.time_of_day,
                });
            }
            day = day.succ();
        }
        None
    }

    /// The scheduled feeding that fell due between two clock readings,
    /// `prev` exclusive and `now` inclusive.
    ///
    /// Elapsed time is measured around the week, so a single weekly slot is
    /// seen again seven days later.  A step larger than
    /// [`MAX_FEED_CATCH_UP_SECS`] is treated as a clock adjustment (first
    /// SNTP sync, timezone change) and fires nothing.
    pub fn feed_due(&self, prev: PlannerEntry, now: PlannerEntry) -> Option<PlannerEntry> {
        if !prev.is_valid() || !now.is_valid() {
            return None;
        }
        let elapsed = (week_secs(now) + SECS_PER_WEEK - week_secs(prev)) % SECS_PER_WEEK;
        if elapsed == 0 || elapsed > MAX_FEED_CATCH_UP_SECS {
            return None;
        }
        self.next_feed_after(prev)
            .filter(|next| next.secs_until <= elapsed)
            .map(|next| next.entry)
    }

    /// Whether a fixed-period feeding is due, `secs_since_last` after the
    /// previous one.
    pub fn periodic_feed_due(&self, secs_since_last: u32) -> bool {
        self.records.get::<FeedRecord>().is_some_and(|feed| {
            feed.has_feature(FeedFeatures::PERIODIC)
                && feed.period_secs() > 0
                && secs_since_last >= feed.period_secs()
        })
    }

    /// Whether the manual button may dispense now.  `None` means no
    /// feeding has happened since boot.
    pub fn manual_feed_allowed(&self, secs_since_last: Option<u32>) -> bool {
        let enabled = self
            .records
            .get::<FeedRecord>()
            .is_some_and(|feed| feed.has_feature(FeedFeatures::MANUAL_BUTTON));
        enabled && secs_since_last.is_none_or(|s| s >= self.manual_feed_lockout_secs)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn records(&self) -> &RecordChain {
        &self.records
    }

    pub fn network(&self) -> Option<&NetworkRecord> {
        self.records.get::<NetworkRecord>()
    }

    pub fn feed(&self) -> Option<&FeedRecord> {
        self.records.get::<FeedRecord>()
    }

    /// Portions to dispense per feeding.
    pub fn portions(&self) -> u8 {
        self.feed().map_or(0, FeedRecord::portions)
    }

    /// Whether any record has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.records.any_dirty()
    }
}
