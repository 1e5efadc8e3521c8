/// A namespaced state key.
///
/// Keys are built from a namespace followed by any number of segments. Every
/// part is length-prefixed, so `("ab", "c")` and `("a", "bc")` never produce
/// the same key and components owning different namespaces can share one
/// [`Store`](crate::Store) without colliding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(Vec<u8>);

impl StateKey {
    /// Start a key in `namespace`.
    pub fn new(namespace: &str) -> Self {
        let mut key = Self(Vec::with_capacity(64));
        key.append(namespace.as_bytes());
        key
    }

    /// Append a segment.
    pub fn push(mut self, segment: impl AsRef<[u8]>) -> Self {
        self.append(segment.as_ref());
        self
    }

    /// The encoded key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn append(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.0.extend_from_slice(bytes);
    }
}

impl AsRef<[u8]> for StateKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<StateKey> for Vec<u8> {
    fn from(key: StateKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_keeps_segment_boundaries() {
        assert_ne!(
            StateKey::new("ns").push("ab").push("c"),
            StateKey::new("ns").push("a").push("bc")
        );
    }

    #[test]
    fn it_separates_namespaces() {
        assert_ne!(
            StateKey::new("revocation").push([1u8; 4]),
            StateKey::new("replay").push([1u8; 4])
        );
    }
}
