use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{StateView, StorageError, Store};

/// A trivial implementation of [Store] - backed by a [HashMap] - where all
/// values are kept in memory and never persisted.
///
/// Clones share the same underlying map.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StateView for MemoryStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }
}

impl Store for MemoryStore {
    fn commit(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.extend(writes);
        Ok(())
    }
}
