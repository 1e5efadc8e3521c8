use crate::StorageError;

mod memory;
pub use memory::*;

/// Read access to key-value state.
pub trait StateView {
    /// Retrieve the value (if any) stored against the given key
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
}

impl<T: StateView + ?Sized> StateView for &T {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read(key)
    }
}

/// A [Store] is a facade over some persistent key-value substrate that is
/// capable of applying a set of writes as one all-or-nothing step.
///
/// Implementations must guarantee that either every write handed to
/// [`Store::commit`] becomes visible or none does. Commits from concurrent
/// callers are serialized.
pub trait Store: StateView {
    /// Atomically apply `writes`.
    fn commit(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StorageError>;
}

impl<T: Store + ?Sized> Store for &T {
    fn commit(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StorageError> {
        (**self).commit(writes)
    }
}
