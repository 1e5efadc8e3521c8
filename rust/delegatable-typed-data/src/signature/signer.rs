//! Signature creation.

use std::{fmt, future::Future};

use k256::ecdsa::SigningKey;
use rand_core::OsRng;

use crate::{Digest, Identity, Principal, RecoverableSignature, SignatureError};

/// Produces recoverable signatures over digests.
///
/// Signing is asynchronous so that remote key custody (hardware wallets,
/// signing services) can implement it; verification never is.
pub trait Signer: Principal {
    /// Sign `digest` and return the recoverable signature.
    fn sign(
        &self,
        digest: &Digest,
    ) -> impl Future<Output = Result<RecoverableSignature, SignatureError>> + Send;
}

/// An in-process secp256k1 signer.
#[derive(Clone)]
pub struct Secp256k1Signer {
    identity: Identity,
    key: SigningKey,
}

impl Secp256k1Signer {
    /// Generate a fresh key from the operating system RNG.
    pub fn generate() -> Self {
        SigningKey::random(&mut OsRng).into()
    }

    /// Import a 32-byte secret scalar.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidKey`] when the bytes are not a valid
    /// non-zero scalar.
    pub fn from_slice(secret: &[u8]) -> Result<Self, SignatureError> {
        let key = SigningKey::from_slice(secret)
            .map_err(|error| SignatureError::InvalidKey(error.to_string()))?;
        Ok(key.into())
    }

    /// Sign `digest` synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::SigningFailed`] if the underlying ECDSA
    /// operation fails.
    pub fn sign_prehash(&self, digest: &Digest) -> Result<RecoverableSignature, SignatureError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|error| SignatureError::SigningFailed(error.to_string()))?;
        Ok(RecoverableSignature::from_parts(&signature, recovery_id))
    }
}

impl From<SigningKey> for Secp256k1Signer {
    fn from(key: SigningKey) -> Self {
        let identity = Identity::from_verifying_key(key.verifying_key());
        Self { identity, key }
    }
}

impl Principal for Secp256k1Signer {
    fn identity(&self) -> Identity {
        self.identity
    }
}

impl Signer for Secp256k1Signer {
    fn sign(
        &self,
        digest: &Digest,
    ) -> impl Future<Output = Result<RecoverableSignature, SignatureError>> + Send {
        std::future::ready(self.sign_prehash(digest))
    }
}

impl fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)
    }
}
