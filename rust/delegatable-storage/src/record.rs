use serde::{Serialize, de::DeserializeOwned};

use crate::{StateKey, StateView, StorageError};

/// Encode `value` as DAG-CBOR.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    serde_ipld_dagcbor::to_vec(value).map_err(|error| StorageError::EncodeFailed(error.to_string()))
}

/// Decode a DAG-CBOR encoded value.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    serde_ipld_dagcbor::from_slice(bytes)
        .map_err(|error| StorageError::DecodeFailed(error.to_string()))
}

/// Read and decode the record stored under `key`, if any.
pub fn read_record<T, V>(view: &V, key: &StateKey) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    V: StateView + ?Sized,
{
    view.read(key.as_bytes())?
        .map(|bytes| decode_record(&bytes))
        .transpose()
}
