//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederService (domain)
//! ```
//!
//! Driven adapters (storage, event sinks) implement these traits.  The
//! [`FeederService`](super::service::FeederService) borrows them per call
//! (`&mut impl StoragePort`), so it never owns a flash handle.

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  It is also the "configuration changed" path: a
/// rebuilt schedule is announced here.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration
// ───────────────────────────────────────────────────────────────

/// Source of the [`SystemConfig`] the feeder boots with.
///
/// `save` rejects out-of-range values with
/// [`ConfigError::ValidationFailed`]; it never clamps.
pub trait ConfigPort {
    /// Stored config, or [`SystemConfig::default()`] when none was saved.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Record storage
// ───────────────────────────────────────────────────────────────

/// Byte-blob store holding one image per record kind.
///
/// A record image lives under `(namespace, record.name())`.  A write either
/// lands completely or not at all; a torn image would otherwise pass as a
/// short read.
pub trait StoragePort {
    /// Copy the blob under `key` into `buf`.  Returns how many bytes were
    /// copied, which is less than the stored length when `buf` is shorter.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The stored blob does not decode as a `SystemConfig`.
    Corrupted,
    /// Names the offending field and its allowed range.
    ValidationFailed(&'static str),
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Nothing stored under the key; a record treats this as first boot.
    NotFound,
    Full,
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
