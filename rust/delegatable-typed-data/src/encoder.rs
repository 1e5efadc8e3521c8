//! Structured typed-data encoding.
//!
//! A struct is hashed as `keccak256(typeHash ‖ encodeData)` where `typeHash`
//! is the hash of its type string (the struct's own signature followed by
//! every referenced struct type in alphabetical order) and every field is
//! encoded to exactly 32 bytes:
//!
//! | Field kind | Encoding |
//! |------------|----------|
//! | `address` | left-padded to 32 bytes |
//! | `uint256` | big-endian, left-padded |
//! | `bytes32` | as is |
//! | `bytes`, `string` | Keccak-256 of the contents |
//! | nested struct | its `hashStruct` |
//! | array of structs | Keccak-256 of the concatenated `hashStruct`s |
//!
//! Folding the type hash into every struct is what keeps a digest of one
//! message type from ever colliding with another, even with identical field
//! bytes.

use alloy_primitives::U256;

use crate::{Digest, Identity, keccak256, keccak256_concat};

const WORD: usize = 32;

/// A message that can be hashed as structured typed data.
pub trait TypedData {
    /// Complete type string: the primary type followed by all referenced
    /// types sorted by name, e.g.
    /// `Mail(Person from,string body)Person(string name,address wallet)`.
    const TYPE: &'static str;

    /// Append this value's fields, in declaration order, to `encoder`.
    fn encode_fields(&self, encoder: &mut StructEncoder);

    /// Keccak-256 of [`TypedData::TYPE`].
    fn type_hash() -> Digest {
        keccak256(Self::TYPE)
    }

    /// `keccak256(typeHash ‖ encodeData(self))`.
    fn hash_struct(&self) -> Digest {
        let mut encoder = StructEncoder::new(Self::type_hash());
        self.encode_fields(&mut encoder);
        encoder.finish()
    }
}

/// Accumulates 32-byte field words for one struct.
#[derive(Debug, Clone)]
pub struct StructEncoder {
    buffer: Vec<u8>,
}

impl StructEncoder {
    /// Start encoding a struct whose type hashes to `type_hash`.
    pub fn new(type_hash: Digest) -> Self {
        let mut buffer = Vec::with_capacity(WORD * 4);
        buffer.extend_from_slice(type_hash.as_bytes());
        Self { buffer }
    }

    /// Encode an `address` field.
    pub fn address(&mut self, identity: &Identity) -> &mut Self {
        let bytes = identity.as_bytes();
        self.buffer
            .extend(std::iter::repeat_n(0u8, WORD - bytes.len()));
        self.buffer.extend_from_slice(bytes);
        self
    }

    /// Encode a `uint256` field.
    pub fn uint(&mut self, value: &U256) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes::<WORD>());
        self
    }

    /// Encode a `bytes32` field.
    pub fn bytes32(&mut self, digest: &Digest) -> &mut Self {
        self.buffer.extend_from_slice(digest.as_bytes());
        self
    }

    /// Encode a dynamic `bytes` field.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes32(&keccak256(bytes))
    }

    /// Encode a `string` field.
    pub fn string(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes())
    }

    /// Encode a nested struct field.
    pub fn structure<T: TypedData>(&mut self, value: &T) -> &mut Self {
        self.bytes32(&value.hash_struct())
    }

    /// Encode an array-of-structs field.
    pub fn array<'a, T, I>(&mut self, values: I) -> &mut Self
    where
        T: TypedData + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let hashes: Vec<Digest> = values.into_iter().map(TypedData::hash_struct).collect();
        let digest = keccak256_concat(hashes.iter().map(|hash| hash.as_bytes().as_slice()));
        self.bytes32(&digest)
    }

    /// Hash the accumulated words.
    pub fn finish(self) -> Digest {
        keccak256(&self.buffer)
    }
}
