//! Weekday-indexed feed planner.
//!
//! Holds recurring time-of-day entries in per-weekday buckets (or a single
//! bucket in daily mode).  Each bucket is a fixed-capacity array kept
//! sorted ascending and free of duplicate times.
//!
//! ```text
//!   Weekly                              Daily
//!   Mon ─▶ [07:00, 18:00]               * ─▶ [07:00, 12:00, 18:00]
//!   Tue ─▶ [07:00, 18:00]
//!   ...
//!   Sun ─▶ [09:00]
//! ```
//!
//! The planner knows nothing about records or storage.  It answers one
//! question, "which stored time controls this reference instant", and
//! leaves calendar rollover to the caller.

use log::debug;
use serde::{Deserialize, Serialize};

/// Seconds in one day; every time-of-day is strictly below this.
pub const SECS_PER_DAY: u32 = 86_400;

/// Capacity of one bucket.
pub const MAX_ENTRIES_PER_BUCKET: usize = 16;

const WEEK_BUCKETS: usize = 7;

// ═══════════════════════════════════════════════════════════════
//  Entry types
// ═══════════════════════════════════════════════════════════════

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// 0 = Monday … 6 = Sunday.
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Bit for this day in a weekday mask (bit 0 = Monday).
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    #[must_use]
    pub fn succ(self) -> Self {
        Self::ALL[(usize::from(self.index()) + 1) % 7]
    }
}

/// One time-of-day on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannerEntry {
    pub weekday: Weekday,
    /// Seconds since midnight.
    pub time_of_day: u32,
}

impl PlannerEntry {
    pub const fn new(weekday: Weekday, time_of_day: u32) -> Self {
        Self {
            weekday,
            time_of_day,
        }
    }

    /// Build from wall-clock components.  `None` when out of range.
    pub fn at(weekday: Weekday, hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        let secs = u32::from(hour) * 3600 + u32::from(minute) * 60 + u32::from(second);
        Some(Self::new(weekday, secs))
    }

    pub fn is_valid(&self) -> bool {
        self.time_of_day < SECS_PER_DAY
    }

    pub fn hour(&self) -> u8 {
        (self.time_of_day / 3600) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.time_of_day % 3600 / 60) as u8
    }
}

impl core::fmt::Display for PlannerEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?} {:02}:{:02}:{:02}",
            self.weekday,
            self.hour(),
            self.minute(),
            self.time_of_day % 60
        )
    }
}

/// Whether entries are kept per weekday or in a single bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerMode {
    /// Seven independent buckets.
    #[default]
    Weekly,
    /// One bucket; the weekday of every entry is ignored.
    Daily,
}

impl PlannerMode {
    pub const fn bucket_count(self) -> usize {
        match self {
            Self::Weekly => WEEK_BUCKETS,
            Self::Daily => 1,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Planner
// ═══════════════════════════════════════════════════════════════

type Bucket = heapless::Vec<u32, MAX_ENTRIES_PER_BUCKET>;

/// Sorted, duplicate-free time-of-day sets per bucket.
///
/// All storage is inline; in daily mode only the first bucket is used.
#[derive(Debug, Clone)]
pub struct Planner {
    mode: PlannerMode,
    buckets: [Bucket; WEEK_BUCKETS],
}

impl Planner {
    pub fn new(mode: PlannerMode) -> Self {
        Self {
            mode,
            buckets: Default::default(),
        }
    }

    pub fn weekly() -> Self {
        Self::new(PlannerMode::Weekly)
    }

    pub fn daily() -> Self {
        Self::new(PlannerMode::Daily)
    }

    pub fn mode(&self) -> PlannerMode {
        self.mode
    }

    fn bucket_index(&self, weekday: Weekday) -> usize {
        match self.mode {
            PlannerMode::Weekly => usize::from(weekday.index()),
            PlannerMode::Daily => 0,
        }
    }

    fn bucket(&self, weekday: Weekday) -> &Bucket {
        &self.buckets[self.bucket_index(weekday)]
    }

    fn bucket_mut(&mut self, weekday: Weekday) -> &mut Bucket {
        let idx = self.bucket_index(weekday);
        &mut self.buckets[idx]
    }

    /// Insert `entry` in order.  `false` if its time is already present,
    /// out of range, or the bucket is full.
    pub fn add_entry(&mut self, entry: PlannerEntry) -> bool {
        if !entry.is_valid() {
            return false;
        }
        let bucket = self.bucket_mut(entry.weekday);
        match bucket.binary_search(&entry.time_of_day) {
            Ok(_) => false,
            Err(pos) => {
                if bucket.insert(pos, entry.time_of_day).is_err() {
                    debug!("Planner: bucket full, dropped {}", entry);
                    return false;
                }
                true
            }
        }
    }

    /// Remove the entry with `entry`'s time.  `true` iff one was removed.
    pub fn delete_entry(&mut self, entry: PlannerEntry) -> bool {
        let bucket = self.bucket_mut(entry.weekday);
        match bucket.binary_search(&entry.time_of_day) {
            Ok(pos) => {
                bucket.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn delete_all_entries(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    pub fn is_entry_set(&self, entry: PlannerEntry) -> bool {
        self.bucket(entry.weekday)
            .binary_search(&entry.time_of_day)
            .is_ok()
    }

    /// The stored entry that controls `reference`.
    ///
    /// Returns the most recent stored time strictly before the reference
    /// time, not the upcoming one.  When the reference lies at or before
    /// the earliest entry the bucket wraps and the earliest entry is
    /// returned.  `None` for an empty bucket.  The result carries the
    /// reference's weekday.
    ///
    /// With entries {08:00, 12:00, 18:00}: 10:00 → 08:00, 07:00 → 08:00
    /// (wrap), 19:00 → 18:00.  For the upcoming feeding use
    /// `FeederService::next_feed_after`.
    pub fn get_next_entry(&self, reference: PlannerEntry) -> Option<PlannerEntry> {
        let bucket = self.bucket(reference.weekday);
        let first = *bucket.first()?;
        let time = bucket
            .iter()
            .rev()
            .copied()
            .find(|&candidate| reference.time_of_day > candidate)
            .unwrap_or(first);
        Some(PlannerEntry::new(reference.weekday, time))
    }

    /// Times stored for `weekday`, ascending.
    pub fn entries(&self, weekday: Weekday) -> &[u32] {
        self.bucket(weekday)
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.buckets[..self.mode.bucket_count()]
            .iter()
            .map(|b| b.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
