use std::collections::BTreeMap;

use serde::Serialize;

use crate::{StateKey, StateView, StorageError, Store, encode_record};

/// Staged writes against a [`Store`].
///
/// Reads observe the transaction's own pending writes first and fall back to
/// the store. Nothing reaches the store until [`StateTransaction::commit`];
/// dropping the transaction discards every pending write.
///
/// [`Savepoint`]s mark a position that later writes can be rolled back to
/// without abandoning the whole transaction, which is how a single failed
/// step is undone while its siblings keep their effects. Every write records
/// the pending value it replaced, so taking a savepoint costs nothing and
/// rolling back touches only the writes made since.
#[derive(Debug)]
pub struct StateTransaction<'a, S: Store + ?Sized> {
    store: &'a S,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
    journal: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

/// A position inside a [`StateTransaction`] that can be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Savepoint {
    depth: usize,
}

impl<'a, S: Store + ?Sized> StateTransaction<'a, S> {
    /// Begin a transaction on `store`.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Stage `value` under `key`.
    pub fn write(&mut self, key: &StateKey, value: Vec<u8>) {
        let key = key.as_bytes().to_vec();
        let previous = self.pending.insert(key.clone(), value);
        self.journal.push((key, previous));
    }

    /// Encode `value` as a record and stage it under `key`.
    pub fn write_record<T: Serialize>(
        &mut self,
        key: &StateKey,
        value: &T,
    ) -> Result<(), StorageError> {
        let bytes = encode_record(value)?;
        self.write(key, bytes);
        Ok(())
    }

    /// Number of staged writes.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Mark the current position.
    pub fn savepoint(&self) -> Savepoint {
        Savepoint {
            depth: self.journal.len(),
        }
    }

    /// Discard every write staged since `savepoint` was taken.
    ///
    /// Rolling back past a savepoint invalidates it; restoring an
    /// invalidated savepoint before any further write does nothing.
    pub fn rollback_to(&mut self, savepoint: Savepoint) {
        if savepoint.depth >= self.journal.len() {
            return;
        }
        tracing::trace!(
            discarded = self.journal.len() - savepoint.depth,
            "rolling back to savepoint"
        );

        for (key, previous) in self.journal.drain(savepoint.depth..).rev() {
            match previous {
                Some(value) => {
                    self.pending.insert(key, value);
                }
                None => {
                    self.pending.remove(&key);
                }
            }
        }
    }

    /// Apply every staged write to the store in one atomic step.
    pub fn commit(self) -> Result<(), StorageError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(writes = self.pending.len(), "committing state transaction");
        self.store.commit(self.pending.into_iter().collect())
    }
}

impl<S: Store + ?Sized> StateView for StateTransaction<'_, S> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        match self.pending.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.store.read(key),
        }
    }
}
