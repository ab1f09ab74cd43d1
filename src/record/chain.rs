//! Ordered set of heterogeneous records with bulk load/save.
//!
//! Each record lives in storage under `namespace::name()`.  Loading never
//! fails: anything that cannot be read back intact is reset to defaults
//! and left dirty, so the following [`RecordChain::save_dirty`] writes the
//! repaired image back.

use log::{debug, info, warn};

use super::{MAX_RECORD_SIZE, Record, RecordError};
use crate::app::ports::{StorageError, StoragePort};

/// What happened to one record during [`RecordChain::load_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored image was intact and is now in use.
    Loaded,
    /// Nothing stored under the record's key (first boot).
    Missing,
    /// Stored image shorter than the record (carries the length read).
    Truncated(usize),
    /// Checksum or magic mismatch.
    Corrupt,
    /// Storage backend error other than "not found".
    ReadFailed,
}

impl LoadOutcome {
    /// Every outcome except [`Loaded`](Self::Loaded) ends in a reset.
    pub fn was_reset(self) -> bool {
        self != Self::Loaded
    }
}

/// Per-record results of a bulk load, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    entries: Vec<(&'static str, LoadOutcome)>,
}

impl LoadReport {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, LoadOutcome)> + '_ {
        self.entries.iter().copied()
    }

    pub fn outcome(&self, name: &str) -> Option<LoadOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, o)| *o)
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.iter().filter(|(_, o)| !o.was_reset()).count()
    }

    pub fn reset_count(&self) -> usize {
        self.entries.iter().filter(|(_, o)| o.was_reset()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The application's list of records.  Owns its records; records never
/// reference each other.
#[derive(Default)]
pub struct RecordChain {
    records: Vec<Box<dyn Record>>,
}

impl RecordChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.  Rejects images larger than the storage scratch
    /// buffer and a second record with an existing name.
    pub fn push<R: Record>(&mut self, record: R) -> Result<(), RecordError> {
        self.push_boxed(Box::new(record))
    }

    pub fn push_boxed(&mut self, record: Box<dyn Record>) -> Result<(), RecordError> {
        if record.rec_size() > MAX_RECORD_SIZE {
            return Err(RecordError::TooLarge(record.rec_size()));
        }
        if self.records.iter().any(|r| r.name() == record.name()) {
            return Err(RecordError::DuplicateKind(record.name()));
        }
        debug!(
            "RecordChain: registered '{}' ({} bytes)",
            record.name(),
            record.rec_size()
        );
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Record> + '_ {
        self.records.iter().map(|r| &**r)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&dyn Record> {
        self.iter().find(|r| r.name() == name)
    }

    /// Typed access to the first record of kind `T`.
    pub fn get<T: Record>(&self) -> Option<&T> {
        self.records
            .iter()
            .find_map(|r| r.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Record>(&mut self) -> Option<&mut T> {
        self.records
            .iter_mut()
            .find_map(|r| r.as_any_mut().downcast_mut::<T>())
    }

    pub fn any_dirty(&self) -> bool {
        self.records.iter().any(|r| r.is_dirty())
    }

    /// Read, validate and if necessary reset every record.
    pub fn load_all(&mut self, storage: &dyn StoragePort, namespace: &str) -> LoadReport {
        let mut report = LoadReport::default();
        let mut buf = [0u8; MAX_RECORD_SIZE];

        for rec in &mut self.records {
            let size = rec.rec_size();
            let outcome = match storage.read(namespace, rec.name(), &mut buf) {
                Ok(len) if len < size => LoadOutcome::Truncated(len),
                Ok(_) => match rec.deserialize(&buf[..size]) {
                    Ok(()) if rec.is_sane() => LoadOutcome::Loaded,
                    _ => LoadOutcome::Corrupt,
                },
                Err(StorageError::NotFound) => LoadOutcome::Missing,
                Err(e) => {
                    warn!("RecordChain: reading '{}' failed: {}", rec.name(), e);
                    LoadOutcome::ReadFailed
                }
            };

            if outcome.was_reset() {
                warn!(
                    "RecordChain: '{}' {:?}, resetting to defaults",
                    rec.name(),
                    outcome
                );
                rec.reset_dflt();
            } else {
                rec.clear_dirty();
                debug!("RecordChain: '{}' loaded", rec.name());
            }
            report.entries.push((rec.name(), outcome));
        }

        info!(
            "RecordChain: {} loaded, {} reset",
            report.loaded_count(),
            report.reset_count()
        );
        report
    }

    /// Write every dirty record.  A record's dirty flag is cleared only
    /// after its write succeeded; the first failure aborts the pass and
    /// leaves the remaining records dirty.
    pub fn save_dirty(
        &mut self,
        storage: &mut dyn StoragePort,
        namespace: &str,
    ) -> crate::error::Result<usize> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let mut saved = 0;

        for rec in self.records.iter_mut().filter(|r| r.is_dirty()) {
            let len = rec.serialize(&mut buf)?;
            if let Err(e) = storage.write(namespace, rec.name(), &buf[..len]) {
                warn!("RecordChain: writing '{}' failed: {}", rec.name(), e);
                return Err(e.into());
            }
            rec.clear_dirty();
            saved += 1;
            info!("RecordChain: '{}' saved ({} bytes)", rec.name(), len);
        }
        Ok(saved)
    }

    /// Factory reset: every record back to defaults (and dirty).
    pub fn reset_all(&mut self) {
        for rec in &mut self.records {
            rec.reset_dflt();
        }
        info!("RecordChain: all {} records reset", self.records.len());
    }
}
