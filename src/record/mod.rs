//! Checksummed configuration records.
//!
//! A record is a small fixed-size byte image kept in non-volatile storage:
//!
//! ```text
//! ┌───────────┬──────────────────────────────┬──────────┐
//! │ magic (4) │ kind-specific fields         │ checksum │
//! └───────────┴──────────────────────────────┴──────────┘
//! ```
//!
//! Every kind implements [`Record`], so the application can load, validate,
//! reset and save all kinds uniformly through a [`RecordChain`] without
//! knowing their concrete types.
//!
//! Lifecycle of one record:
//!
//! ```text
//!  zeroed ──deserialize──▶ loaded ──is_sane?──▶ sane/clean ──setter──▶ sane/dirty
//!                             │                                          │
//!                             └─ not sane ──reset_dflt──▶ sane/dirty ◀───┘
//!                                                            │
//!                                       serialize + confirmed write + clear_dirty
//! ```

pub mod chain;
pub mod checksum;
pub mod feed;
pub mod network;

use core::any::Any;
use core::fmt;

pub use chain::{LoadOutcome, LoadReport, RecordChain};
pub use feed::{FeedFeatures, FeedRecord, FeedSlot};
pub use network::NetworkRecord;

/// Length of the magic tag at the start of every record image.
pub const MAGIC_LEN: usize = 4;

/// Largest record image any kind may declare.  Sizes the scratch buffer
/// used when moving images to and from storage.
pub const MAX_RECORD_SIZE: usize = 64;

// ───────────────────────────────────────────────────────────────
// Record contract
// ───────────────────────────────────────────────────────────────

/// Integrity-checked, resettable, serializable configuration block.
pub trait Record: Any {
    /// Short kind name, also used as the storage key.
    fn name(&self) -> &'static str;

    /// Magic tag expected at offset 0.
    fn magic(&self) -> &'static [u8; MAGIC_LEN];

    /// True iff the checksum is valid and the magic tag matches.
    /// Never mutates.
    fn is_sane(&self) -> bool;

    /// True when in-memory content is newer than what was last persisted.
    fn is_dirty(&self) -> bool;

    /// Called by the owner once the serialized image has been written.
    fn clear_dirty(&mut self);

    /// Rewrite magic and every field with the kind's defaults, reseal and
    /// mark dirty.
    fn reset_dflt(&mut self);

    /// Size of the serialized image in bytes.
    fn rec_size(&self) -> usize;

    /// Copy the current image into `out`.  Returns the number of bytes
    /// written (always [`rec_size`](Record::rec_size)).
    fn serialize(&self, out: &mut [u8]) -> Result<usize, RecordError>;

    /// Copy an external image in verbatim.  Does not validate; call
    /// [`is_sane`](Record::is_sane) afterwards.
    fn deserialize(&mut self, src: &[u8]) -> Result<(), RecordError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

/// Errors from record and record-chain operations.
///
/// Corruption is deliberately absent: a corrupt image is reported by
/// [`Record::is_sane`] and recovered with [`Record::reset_dflt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// A caller-supplied buffer is shorter than the record image.
    BufferTooSmall { needed: usize, got: usize },
    /// The record image exceeds [`MAX_RECORD_SIZE`].
    TooLarge(usize),
    /// A record with the same name is already in the chain.
    DuplicateKind(&'static str),
    /// Slot index beyond the kind's slot table.
    SlotOutOfRange(usize),
    /// Time-of-day not below 86 400 seconds.
    InvalidTimeOfDay(u32),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, got } => {
                write!(f, "buffer too small: need {needed} bytes, got {got}")
            }
            Self::TooLarge(size) => {
                write!(f, "record of {size} bytes exceeds {MAX_RECORD_SIZE}")
            }
            Self::DuplicateKind(name) => write!(f, "duplicate record kind '{name}'"),
            Self::SlotOutOfRange(i) => write!(f, "slot {i} out of range"),
            Self::InvalidTimeOfDay(t) => write!(f, "time of day {t}s out of range"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared image storage
// ───────────────────────────────────────────────────────────────

/// Byte image plus dirty flag, shared by every concrete record kind.
///
/// The image is the single source of truth: getters decode from it and
/// setters encode into it.  Setters reseal immediately, so the image is
/// always self-consistent and safe to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordImage<const N: usize> {
    bytes: [u8; N],
    dirty: bool,
}

impl<const N: usize> Default for RecordImage<N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> RecordImage<N> {
    pub const fn zeroed() -> Self {
        Self {
            bytes: [0; N],
            dirty: false,
        }
    }

    pub fn bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Checksum and magic both valid.
    pub fn is_sane(&self, magic: &[u8; MAGIC_LEN]) -> bool {
        N > MAGIC_LEN && self.bytes[..MAGIC_LEN] == magic[..] && checksum::verify(&self.bytes)
    }

    /// Zero the image, stamp `magic`, let `fill` write the defaults, reseal
    /// and mark dirty.
    pub fn reset(&mut self, magic: &[u8; MAGIC_LEN], fill: impl FnOnce(&mut Self)) {
        self.bytes = [0; N];
        self.bytes[..MAGIC_LEN].copy_from_slice(magic);
        fill(self);
        checksum::seal(&mut self.bytes);
        self.dirty = true;
    }

    pub fn store(&self, out: &mut [u8]) -> Result<usize, RecordError> {
        let got = out.len();
        let dst = out
            .get_mut(..N)
            .ok_or(RecordError::BufferTooSmall { needed: N, got })?;
        dst.copy_from_slice(&self.bytes);
        Ok(N)
    }

    /// Verbatim copy-in.  The dirty flag is left alone; loaded bytes are by
    /// definition what storage already holds.
    pub fn load(&mut self, src: &[u8]) -> Result<(), RecordError> {
        let src = src.get(..N).ok_or(RecordError::BufferTooSmall {
            needed: N,
            got: src.len(),
        })?;
        self.bytes.copy_from_slice(src);
        Ok(())
    }

    // ── Field codec ──────────────────────────────────────────

    pub fn u8_at(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    pub fn u32_at(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[offset..offset + 4]);
        u32::from_le_bytes(raw)
    }

    pub fn array_at<const W: usize>(&self, offset: usize) -> [u8; W] {
        let mut raw = [0u8; W];
        raw.copy_from_slice(&self.bytes[offset..offset + W]);
        raw
    }

    /// Write `value` at `offset`.  On change: reseal and mark dirty.
    /// Returns whether anything changed.
    pub fn set_bytes(&mut self, offset: usize, value: &[u8]) -> bool {
        let field = &mut self.bytes[offset..offset + value.len()];
        if field == value {
            return false;
        }
        field.copy_from_slice(value);
        checksum::seal(&mut self.bytes);
        self.dirty = true;
        true
    }

    pub fn set_u8(&mut self, offset: usize, value: u8) -> bool {
        self.set_bytes(offset, &[value])
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) -> bool {
        self.set_bytes(offset, &value.to_le_bytes())
    }

    /// Raw write used while filling defaults inside [`reset`](Self::reset);
    /// no reseal, no dirty bookkeeping.
    pub fn put(&mut self, offset: usize, value: &[u8]) {
        self.bytes[offset..offset + value.len()].copy_from_slice(value);
    }
}
