use thiserror::Error;

/// Errors produced while parsing identities and digests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypedDataError {
    /// Input did not contain the expected number of bytes
    #[error("Expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Number of bytes the value must have
        expected: usize,
        /// Number of bytes that were supplied
        actual: usize,
    },

    /// Input is not valid hex
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Input is not a valid unsigned 256-bit integer
    #[error("Invalid integer {0:?}")]
    InvalidInteger(String),
}

/// Errors produced while signing digests or recovering signers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature bytes are malformed, use a high `s` value or do not
    /// recover to a usable identity.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// The signature recovered to the reserved null identity.
    #[error("Signature recovers to the null identity")]
    NullSigner,

    /// The signing key is unusable.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// Producing the signature failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}
