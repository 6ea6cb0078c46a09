//! Scoped write transactions
//!
//! A [`StoreTxn`] holds the engine's writer lock for its whole lifetime, so
//! reads made through it observe every write committed before it began and
//! nothing committed concurrently. Writes are buffered in an overlay that the
//! transaction's own reads see; `commit` applies the overlay as one atomic
//! fjall batch. Dropping the handle without committing discards everything.

use cns_core::*;
use parking_lot::MutexGuard;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use crate::table::TableKind;
use crate::{storage_error, StorageEngine};

type Overlay = BTreeMap<(TableKind, Vec<u8>), Option<Vec<u8>>>;

pub struct StoreTxn<'a> {
    engine: &'a StorageEngine,
    _writer: MutexGuard<'a, ()>,
    overlay: Overlay,
    finished: bool,
}

impl<'a> StoreTxn<'a> {
    pub(crate) fn begin(engine: &'a StorageEngine) -> Self {
        let writer = engine.writer().lock();
        trace!("transaction started");
        StoreTxn {
            engine,
            _writer: writer,
            overlay: BTreeMap::new(),
            finished: false,
        }
    }

    pub(crate) fn get_raw(&self, kind: TableKind, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.overlay.get(&(kind, key.to_vec())) {
            Some(pending) => Ok(pending.clone()),
            None => self.engine.tables().get(kind).get_raw(key),
        }
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, kind: TableKind, key: &[u8]) -> Result<Option<T>> {
        match self.get_raw(kind, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Committed entries under `prefix` merged with this transaction's pending writes
    pub(crate) fn scan_prefix(&self, kind: TableKind, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .engine
            .tables()
            .get(kind)
            .scan_prefix(prefix)?
            .into_iter()
            .collect();

        let pending = self
            .overlay
            .range((kind, prefix.to_vec())..)
            .take_while(|((k, key), _)| *k == kind && key.starts_with(prefix));
        for ((_, key), value) in pending {
            match value {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }

        Ok(merged.into_iter().collect())
    }

    pub(crate) fn put<T: Serialize>(&mut self, kind: TableKind, key: impl Into<Vec<u8>>, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(kind, key, bytes);
        Ok(())
    }

    pub(crate) fn put_raw(&mut self, kind: TableKind, key: impl Into<Vec<u8>>, value: Vec<u8>) {
        self.overlay.insert((kind, key.into()), Some(value));
    }

    pub(crate) fn remove(&mut self, kind: TableKind, key: impl Into<Vec<u8>>) {
        self.overlay.insert((kind, key.into()), None);
    }

    /// Number of buffered writes (inserts and removals)
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }

    /// Apply every buffered write atomically, then flush to disk.
    ///
    /// Once the batch commits the writes are visible to every reader, so a
    /// failed flush afterwards is logged rather than reported to the caller.
    pub fn commit(mut self) -> Result<()> {
        let overlay = std::mem::take(&mut self.overlay);
        let writes = overlay.len();
        self.finished = true;

        if writes == 0 {
            return Ok(());
        }

        let tables = self.engine.tables();
        let mut batch = self.engine.keyspace().batch();
        for ((kind, key), value) in overlay {
            let partition = tables.get(kind).partition();
            match value {
                Some(value) => batch.insert(partition, key, value),
                None => batch.remove(partition, key),
            }
        }
        batch.commit().map_err(storage_error)?;
        let durable = settle_flush(self.engine.persist(), writes);

        debug!(writes, durable, "transaction committed");
        Ok(())
    }
}

/// Outcome of the flush that follows a committed batch. Returns whether the
/// writes are known to be on disk.
fn settle_flush(flushed: Result<()>, writes: usize) -> bool {
    match flushed {
        Ok(()) => true,
        Err(e) => {
            warn!(writes, error = %e, "committed batch not flushed to disk");
            false
        }
    }
}

impl Drop for StoreTxn<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(discarded = self.overlay.len(), "transaction rolled back");
        }
    }
}
