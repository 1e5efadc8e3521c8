//! Recoverable signatures and signer recovery.

pub mod signer;

pub use signer::*;

use std::fmt;

use alloy_primitives::hex;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Digest, Identity, SignatureError};

/// The size of a recoverable signature in bytes.
pub const SIGNATURE_SIZE: usize = 65;

/// A 65-byte recoverable secp256k1 signature laid out as `r ‖ s ‖ v`.
///
/// `v` is accepted both as the raw recovery id (`0`/`1`) and in its
/// `27`/`28` form; signatures produced by this crate use the latter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature([u8; SIGNATURE_SIZE]);

impl RecoverableSignature {
    /// Assemble a signature from its ECDSA parts.
    pub fn from_parts(signature: &EcdsaSignature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Self(bytes)
    }

    /// Borrow the raw signature bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    fn split(&self) -> Result<(EcdsaSignature, RecoveryId), SignatureError> {
        let signature = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|error| SignatureError::InvalidSignature(error.to_string()))?;

        // Malleable twin signatures would let one authorization surface
        // under two different packet digests.
        if signature.normalize_s().is_some() {
            return Err(SignatureError::InvalidSignature(
                "signature uses a high s value".into(),
            ));
        }

        let v = match self.0[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            v => {
                return Err(SignatureError::InvalidSignature(format!(
                    "unsupported recovery byte {v}"
                )));
            }
        };
        let recovery_id = RecoveryId::from_byte(v).ok_or_else(|| {
            SignatureError::InvalidSignature(format!("unsupported recovery byte {v}"))
        })?;

        Ok((signature, recovery_id))
    }
}

/// Recover the identity that signed `digest`.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidSignature`] when the signature is
/// malformed or does not recover to a public key, and
/// [`SignatureError::NullSigner`] when it recovers to [`Identity::NULL`].
pub fn recover_signer(
    digest: &Digest,
    signature: &RecoverableSignature,
) -> Result<Identity, SignatureError> {
    let (signature, recovery_id) = signature.split()?;
    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
        .map_err(|error| SignatureError::InvalidSignature(error.to_string()))?;

    let identity = Identity::from_verifying_key(&key);
    if identity.is_null() {
        return Err(SignatureError::NullSigner);
    }
    Ok(identity)
}

impl From<[u8; SIGNATURE_SIZE]> for RecoverableSignature {
    fn from(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for RecoverableSignature {
    type Error = SignatureError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SIGNATURE_SIZE] = bytes.try_into().map_err(|_| {
            SignatureError::InvalidSignature(format!(
                "expected {SIGNATURE_SIZE} signature bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for RecoverableSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", hex::encode_prefixed(self.0))
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode_prefixed(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            let bytes = hex::decode(&text).map_err(de::Error::custom)?;
            RecoverableSignature::try_from(bytes.as_slice()).map_err(de::Error::custom)
        } else {
            let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
            RecoverableSignature::try_from(bytes.as_slice()).map_err(de::Error::custom)
        }
    }
}
