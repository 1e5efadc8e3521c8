//! Error types for the invocation engine.
//!
//! [`AuthorityError`] is the reason an invocation, batch or revocation was
//! refused. Host surfaces that need a stable classification convert it into a
//! [`ServiceError`], whose [`ErrorCode`] serializes as a fixed reason tag and
//! maps onto an HTTP-like status code.

use alloy_primitives::U256;
use delegatable_storage::StorageError;
use delegatable_typed_data::{Digest, Identity, SignatureError};
use serde::Serialize;
use thiserror::Error;

/// Why a piece of authority was not honoured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    /// The batch signature is malformed or recovers to the null identity.
    #[error("Invalid batch signature: {0}")]
    InvalidSignature(SignatureError),

    /// The signature of a delegation link is malformed.
    #[error("Invalid signature on link {link}: {source}")]
    InvalidLinkSignature {
        /// Index of the offending link
        link: usize,
        /// Underlying signature failure
        source: SignatureError,
    },

    /// A link does not point at the digest of the next link.
    #[error("Link {link} names authority {found}, expected {expected}")]
    ChainLinkageMismatch {
        /// Index of the offending link
        link: usize,
        /// Digest of the next link or the root sentinel
        expected: Digest,
        /// Authority the link actually names
        found: Digest,
    },

    /// The chain is longer than the configured maximum.
    #[error("Authority chain has {depth} links, at most {max} are allowed")]
    ChainTooDeep {
        /// Number of links supplied
        depth: usize,
        /// Configured limit
        max: usize,
    },

    /// A link was delegated to someone other than the party using it.
    #[error("Link {link} delegates to {found}, but it is used by {expected}")]
    DelegateMismatch {
        /// Index of the offending link
        link: usize,
        /// The party exercising the link
        expected: Identity,
        /// The delegate named by the link
        found: Identity,
    },

    /// The chain does not originate at the resource's root authority.
    #[error("Authority originates at {found}, but the root authority is {expected}")]
    RootAuthorityMismatch {
        /// Root authority declared by the resource
        expected: Identity,
        /// Origin of the supplied chain
        found: Identity,
    },

    /// A caveat refused the invocation.
    #[error("Caveat {enforcer} on link {link} rejected the invocation: {reason}")]
    CaveatRejected {
        /// Enforcer that refused
        enforcer: Identity,
        /// Index of the link carrying the caveat
        link: usize,
        /// Enforcer supplied reason
        reason: String,
    },

    /// A link of the chain has been revoked.
    #[error("Delegation {delegation} on link {link} has been revoked")]
    Revoked {
        /// Index of the revoked link
        link: usize,
        /// Digest of the revoked signed delegation
        delegation: Digest,
    },

    /// A caveat names an enforcer nobody registered.
    #[error("Unknown caveat enforcer {enforcer} on link {link}")]
    UnknownEnforcer {
        /// The unknown enforcer reference
        enforcer: Identity,
        /// Index of the link carrying the caveat
        link: usize,
    },

    /// The batch nonce is not the next one in its queue.
    #[error("Nonce {found} rejected for {signer} in queue {queue}, expected {expected}")]
    ReplayRejected {
        /// Signer owning the queue
        signer: Identity,
        /// Queue the batch was sent on
        queue: U256,
        /// The only nonce currently accepted
        expected: U256,
        /// Nonce the batch carried
        found: U256,
    },

    /// The caller is not allowed to perform the operation.
    #[error("{caller} is not allowed to act for {delegator}")]
    Unauthorized {
        /// Identity that attempted the operation
        caller: Identity,
        /// Identity entitled to perform it
        delegator: Identity,
    },

    /// An invocation addresses a resource other than the bound one.
    #[error("Invocation targets {found}, but this resource is {expected}")]
    TargetMismatch {
        /// Identity of the bound resource
        expected: Identity,
        /// Target named by the invocation
        found: Identity,
    },

    /// An atomic batch was abandoned because one of its invocations failed.
    #[error("Batch aborted after invocation {failed} failed")]
    BatchAborted {
        /// Index of the first failed invocation
        failed: usize,
    },

    /// The protected resource refused or failed the operation.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// State could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Reason a caveat enforcer refused an invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaveatError {
    /// The link has been revoked.
    #[error("Delegation has been revoked")]
    Revoked,

    /// The enforcer's condition does not hold.
    #[error("{0}")]
    Rejected(String),

    /// Enforcer state could not be read.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure reported by a protected resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The payload does not name an operation the resource understands.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The operation was understood but refused.
    #[error("Operation rejected: {0}")]
    Rejected(String),

    /// Resource state could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error codes for host surfaces.
///
/// Each code maps to an HTTP status code via [`ErrorCode::status_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 400 Bad Request
    /// Resource could not make sense of the payload
    InvalidPayload,
    /// Invocation addressed another resource
    TargetMismatch,

    // 401 Unauthorized
    /// Signature could not be recovered
    InvalidSignature,
    /// Batch nonce was not the next one
    ReplayRejected,

    // 403 Forbidden
    /// Links do not form a chain
    ChainLinkageMismatch,
    /// Chain exceeds the configured depth
    ChainTooDeep,
    /// A caveat refused the invocation
    CaveatRejected,
    /// A link has been revoked
    Revoked,
    /// Caller may not perform the operation
    Unauthorized,
    /// A caveat names an unregistered enforcer
    UnknownEnforcer,

    // 409 Conflict
    /// An atomic batch was abandoned
    BatchAborted,
    /// The resource refused the operation
    ResourceRejected,

    // 500 Internal Server Error
    /// Internal error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidPayload | ErrorCode::TargetMismatch => 400,

            ErrorCode::InvalidSignature | ErrorCode::ReplayRejected => 401,

            ErrorCode::ChainLinkageMismatch
            | ErrorCode::ChainTooDeep
            | ErrorCode::CaveatRejected
            | ErrorCode::Revoked
            | ErrorCode::Unauthorized
            | ErrorCode::UnknownEnforcer => 403,

            ErrorCode::BatchAborted | ErrorCode::ResourceRejected => 409,

            ErrorCode::InternalError => 500,
        }
    }
}

/// Service error with code and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    /// The error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl ServiceError {
    /// Create a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

impl From<AuthorityError> for ServiceError {
    fn from(error: AuthorityError) -> Self {
        let code = match &error {
            AuthorityError::InvalidSignature(_) | AuthorityError::InvalidLinkSignature { .. } => {
                ErrorCode::InvalidSignature
            }
            AuthorityError::ChainLinkageMismatch { .. }
            | AuthorityError::DelegateMismatch { .. }
            | AuthorityError::RootAuthorityMismatch { .. } => ErrorCode::ChainLinkageMismatch,
            AuthorityError::ChainTooDeep { .. } => ErrorCode::ChainTooDeep,
            AuthorityError::CaveatRejected { .. } => ErrorCode::CaveatRejected,
            AuthorityError::Revoked { .. } => ErrorCode::Revoked,
            AuthorityError::UnknownEnforcer { .. } => ErrorCode::UnknownEnforcer,
            AuthorityError::ReplayRejected { .. } => ErrorCode::ReplayRejected,
            AuthorityError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AuthorityError::TargetMismatch { .. } => ErrorCode::TargetMismatch,
            AuthorityError::BatchAborted { .. } => ErrorCode::BatchAborted,
            AuthorityError::Resource(ResourceError::MalformedPayload(_)) => {
                ErrorCode::InvalidPayload
            }
            AuthorityError::Resource(ResourceError::Rejected(_)) => ErrorCode::ResourceRejected,
            AuthorityError::Resource(ResourceError::Storage(_)) | AuthorityError::Storage(_) => {
                ErrorCode::InternalError
            }
        };
        ServiceError::new(code, error.to_string())
    }
}
