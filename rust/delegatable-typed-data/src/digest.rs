//! Fixed-size Keccak-256 digests.

use std::{fmt, str::FromStr};

use alloy_primitives::{B256, Keccak256, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::TypedDataError;

/// The size of a digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// A 32-byte Keccak-256 digest.
///
/// The all-zero digest is reserved as [`Digest::ROOT`], the sentinel a
/// delegation uses as its `authority` when it is issued directly by the
/// root authority.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Digest(B256);

impl Digest {
    /// Sentinel authority of a delegation issued by the root authority itself.
    pub const ROOT: Digest = Digest(B256::ZERO);

    /// Whether this is the [`Digest::ROOT`] sentinel.
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    /// Borrow the raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0.0
    }

    /// The digest as a 32-byte word.
    pub const fn as_word(&self) -> &B256 {
        &self.0
    }
}

/// Hash `bytes` with Keccak-256.
pub fn keccak256(bytes: impl AsRef<[u8]>) -> Digest {
    Digest(alloy_primitives::keccak256(bytes))
}

/// Hash the concatenation of `chunks` with Keccak-256 without allocating
/// the joined buffer.
pub fn keccak256_concat<'a, I>(chunks: I) -> Digest
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Keccak256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    Digest(hasher.finalize())
}

impl From<[u8; DIGEST_SIZE]> for Digest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(B256::new(bytes))
    }
}

impl From<B256> for Digest {
    fn from(word: B256) -> Self {
        Self(word)
    }
}

impl From<Digest> for B256 {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl From<Digest> for [u8; DIGEST_SIZE] {
    fn from(digest: Digest) -> Self {
        digest.0.0
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = TypedDataError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        B256::try_from(bytes)
            .map(Self)
            .map_err(|_| TypedDataError::InvalidLength {
                expected: DIGEST_SIZE,
                actual: bytes.len(),
            })
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl FromStr for Digest {
    type Err = TypedDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|error| TypedDataError::InvalidHex(error.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(de::Error::custom)
        } else {
            let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
            Digest::try_from(bytes.as_slice()).map_err(de::Error::custom)
        }
    }
}
