//! Feed-schedule settings record.
//!
//! | Offset | Width  | Field                                      |
//! |--------|--------|--------------------------------------------|
//! | 0      | 4      | magic `FEED`                               |
//! | 4      | 4      | feed period, seconds (u32 LE)              |
//! | 8      | 1      | feature flags ([`FeedFeatures`])           |
//! | 9      | 1      | portions per feeding                       |
//! | 10     | 8 × 5  | slots: weekday mask (u8), time-of-day (u32 LE) |
//! | 50     | 1      | checksum                                   |
//!
//! Weekday mask bit 0 is Monday, bit 6 is Sunday.  A slot with an empty
//! mask is unused.

use core::any::Any;
use core::ops::BitOr;

use super::{MAGIC_LEN, Record, RecordError, RecordImage};

pub const FEED_MAGIC: [u8; MAGIC_LEN] = *b"FEED";
pub const FEED_SLOTS: usize = 8;
pub const FEED_RECORD_SIZE: usize = OFF_SLOTS + FEED_SLOTS * SLOT_WIDTH + 1;

const OFF_PERIOD: usize = 4;
const OFF_FEATURES: usize = 8;
const OFF_PORTIONS: usize = 9;
const OFF_SLOTS: usize = 10;
const SLOT_WIDTH: usize = 5;

const SECS_PER_DAY: u32 = 86_400;

const DEFAULT_PERIOD_SECS: u32 = 12 * 3600;
const DEFAULT_PORTIONS: u8 = 1;

// ───────────────────────────────────────────────────────────────
// Feature flags
// ───────────────────────────────────────────────────────────────

/// Feature-enable bits stored in the feed record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedFeatures(u8);

impl FeedFeatures {
    pub const NONE: Self = Self(0);
    /// Feed at the planner's slot times.
    pub const SCHEDULE: Self = Self(0b0000_0001);
    /// Feed every `period_secs` regardless of the clock.
    pub const PERIODIC: Self = Self(0b0000_0010);
    /// Front-panel button dispenses one portion.
    pub const MANUAL_BUTTON: Self = Self(0b0000_0100);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for FeedFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Slots
// ───────────────────────────────────────────────────────────────

/// One recurring feeding time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSlot {
    /// Weekday mask, bit 0 = Monday.
    pub days: u8,
    /// Seconds since midnight.
    pub time_of_day: u32,
}

impl FeedSlot {
    pub const EVERY_DAY: u8 = 0b0111_1111;
    pub const WEEKDAYS: u8 = 0b0001_1111;
    pub const WEEKEND: u8 = 0b0110_0000;

    pub fn new(days: u8, time_of_day: u32) -> Result<Self, RecordError> {
        if time_of_day >= SECS_PER_DAY {
            return Err(RecordError::InvalidTimeOfDay(time_of_day));
        }
        Ok(Self {
            days: days & Self::EVERY_DAY,
            time_of_day,
        })
    }

    /// Convenience constructor from hours and minutes.
    pub fn at(days: u8, hour: u8, minute: u8) -> Result<Self, RecordError> {
        Self::new(days, u32::from(hour) * 3600 + u32::from(minute) * 60)
    }

    pub fn is_used(&self) -> bool {
        self.days & Self::EVERY_DAY != 0
    }

    /// Whether the slot fires on day `index` (0 = Monday … 6 = Sunday).
    pub fn runs_on(&self, index: u8) -> bool {
        index < 7 && self.days & (1 << index) != 0
    }
}

// ───────────────────────────────────────────────────────────────
// Record
// ───────────────────────────────────────────────────────────────

/// Feeding period, feature flags, portion size and the slot table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedRecord {
    image: RecordImage<FEED_RECORD_SIZE>,
}

impl FeedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut rec = Self::new();
        rec.reset_dflt();
        rec
    }

    pub fn period_secs(&self) -> u32 {
        self.image.u32_at(OFF_PERIOD)
    }

    pub fn set_period_secs(&mut self, secs: u32) {
        self.image.set_u32(OFF_PERIOD, secs);
    }

    pub fn features(&self) -> FeedFeatures {
        FeedFeatures::from_bits(self.image.u8_at(OFF_FEATURES))
    }

    pub fn set_features(&mut self, features: FeedFeatures) {
        self.image.set_u8(OFF_FEATURES, features.bits());
    }

    pub fn has_feature(&self, feature: FeedFeatures) -> bool {
        self.features().contains(feature)
    }

    pub fn portions(&self) -> u8 {
        self.image.u8_at(OFF_PORTIONS)
    }

    pub fn set_portions(&mut self, portions: u8) {
        self.image.set_u8(OFF_PORTIONS, portions);
    }

    /// Slot `index`, used or not.  `None` past the end of the table.
    pub fn slot(&self, index: usize) -> Option<FeedSlot> {
        if index >= FEED_SLOTS {
            return None;
        }
        let off = slot_offset(index);
        Some(FeedSlot {
            days: self.image.u8_at(off),
            time_of_day: self.image.u32_at(off + 1),
        })
    }

    pub fn set_slot(&mut self, index: usize, slot: FeedSlot) -> Result<(), RecordError> {
        if index >= FEED_SLOTS {
            return Err(RecordError::SlotOutOfRange(index));
        }
        if slot.time_of_day >= SECS_PER_DAY {
            return Err(RecordError::InvalidTimeOfDay(slot.time_of_day));
        }
        let mut raw = [0u8; SLOT_WIDTH];
        raw[0] = slot.days;
        raw[1..].copy_from_slice(&slot.time_of_day.to_le_bytes());
        self.image.set_bytes(slot_offset(index), &raw);
        Ok(())
    }

    pub fn clear_slot(&mut self, index: usize) -> Result<(), RecordError> {
        self.set_slot(index, FeedSlot::default())
    }

    /// Used slots in table order.
    pub fn slots(&self) -> impl Iterator<Item = FeedSlot> + '_ {
        (0..FEED_SLOTS)
            .filter_map(|i| self.slot(i))
            .filter(FeedSlot::is_used)
    }

    pub fn as_bytes(&self) -> &[u8; FEED_RECORD_SIZE] {
        self.image.bytes()
    }
}

const fn slot_offset(index: usize) -> usize {
    OFF_SLOTS + index * SLOT_WIDTH
}

impl Record for FeedRecord {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn magic(&self) -> &'static [u8; MAGIC_LEN] {
        &FEED_MAGIC
    }

    fn is_sane(&self) -> bool {
        self.image.is_sane(&FEED_MAGIC)
    }

    fn is_dirty(&self) -> bool {
        self.image.is_dirty()
    }

    fn clear_dirty(&mut self) {
        self.image.clear_dirty();
    }

    fn reset_dflt(&mut self) {
        self.image.reset(&FEED_MAGIC, |img| {
            img.put(OFF_PERIOD, &DEFAULT_PERIOD_SECS.to_le_bytes());
            let features = FeedFeatures::SCHEDULE | FeedFeatures::MANUAL_BUTTON;
            img.put(OFF_FEATURES, &[features.bits()]);
            img.put(OFF_PORTIONS, &[DEFAULT_PORTIONS]);

            // 07:00 and 18:00 every day.
            for (i, secs) in [7 * 3600u32, 18 * 3600].into_iter().enumerate() {
                let off = slot_offset(i);
                img.put(off, &[FeedSlot::EVERY_DAY]);
                img.put(off + 1, &secs.to_le_bytes());
            }
        });
    }

    fn rec_size(&self) -> usize {
        FEED_RECORD_SIZE
    }

    fn serialize(&self, out: &mut [u8]) -> Result<usize, RecordError> {
        self.image.store(out)
    }

    fn deserialize(&mut self, src: &[u8]) -> Result<(), RecordError> {
        self.image.load(src)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
