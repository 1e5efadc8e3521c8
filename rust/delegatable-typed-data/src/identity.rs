//! Principal identities.

use std::{fmt, str::FromStr};

use alloy_primitives::{Address, hex};
use k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{TypedDataError, keccak256};

/// The size of an identity in bytes.
pub const IDENTITY_SIZE: usize = 20;

/// A 20-byte principal identity.
///
/// Identities of key holders are derived from their secp256k1 public key:
/// the trailing 20 bytes of the Keccak-256 hash of the uncompressed point
/// (without its `0x04` prefix). Resources and enforcers are referenced by
/// identities too, but those are simply assigned.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Identity(Address);

impl Identity {
    /// The reserved null identity. No valid signature recovers to it.
    pub const NULL: Identity = Identity(Address::ZERO);

    /// An identity with the given bytes.
    pub const fn new(bytes: [u8; IDENTITY_SIZE]) -> Self {
        Self(Address::new(bytes))
    }

    /// Derive the identity that owns `key`.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        Self(Address::from_word(*keccak256(&point.as_bytes()[1..]).as_word()))
    }

    /// Whether this is the [`Identity::NULL`] identity.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Borrow the raw identity bytes.
    pub const fn as_bytes(&self) -> &[u8; IDENTITY_SIZE] {
        &self.0.0.0
    }

    /// The identity as an account address.
    pub const fn as_address(&self) -> &Address {
        &self.0
    }
}

/// An entity identified by an [`Identity`].
///
/// Implemented by signers, resources and anything else that acts under a
/// stable identity.
pub trait Principal {
    /// Returns this entity's identity.
    fn identity(&self) -> Identity;
}

impl Principal for Identity {
    fn identity(&self) -> Identity {
        *self
    }
}

impl From<[u8; IDENTITY_SIZE]> for Identity {
    fn from(bytes: [u8; IDENTITY_SIZE]) -> Self {
        Self::new(bytes)
    }
}

impl From<Address> for Identity {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl From<Identity> for Address {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = TypedDataError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Address::try_from(bytes)
            .map(Self)
            .map_err(|_| TypedDataError::InvalidLength {
                expected: IDENTITY_SIZE,
                actual: bytes.len(),
            })
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl FromStr for Identity {
    type Err = TypedDataError;

    /// Parses hex in any case. Mixed-case input is not checked against its
    /// checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|error| TypedDataError::InvalidHex(error.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(de::Error::custom)
        } else {
            let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
            Identity::try_from(bytes.as_slice()).map_err(de::Error::custom)
        }
    }
}
