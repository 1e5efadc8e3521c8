#![warn(missing_docs)]

//! Typed-data digests and recoverable signatures.
//!
//! This crate provides the two leaf pieces every delegated-authority message
//! depends on:
//!
//! - **Digests**: messages are hashed as structured typed data: every struct
//!   is folded together with the hash of its type string, and the final digest
//!   is bound to a [`DomainContext`] naming the verifying resource, the
//!   deployment name and the network it lives on. A digest computed for one
//!   resource can never be replayed against another, and two different message
//!   types never collide even when their field bytes are identical.
//! - **Signatures**: 65-byte recoverable secp256k1 signatures from which the
//!   signer's [`Identity`] is recovered with [`recover_signer`].
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::U256;
//! use delegatable_typed_data::{
//!     DomainContext, Identity, StructEncoder, TypedData, Digest, recover_signer,
//!     Secp256k1Signer, Principal,
//! };
//!
//! struct Ping {
//!     from: Identity,
//!     count: U256,
//! }
//!
//! impl TypedData for Ping {
//!     const TYPE: &'static str = "Ping(address from,uint256 count)";
//!
//!     fn encode_fields(&self, encoder: &mut StructEncoder) {
//!         encoder.address(&self.from).uint(&self.count);
//!     }
//! }
//!
//! let signer = Secp256k1Signer::from_slice(&[7u8; 32]).unwrap();
//! let domain = DomainContext::new("Example", 1, Identity::from([1u8; 20]));
//! let message = Ping { from: signer.identity(), count: U256::from(3u64) };
//!
//! let digest: Digest = domain.digest(&message);
//! let signature = signer.sign_prehash(&digest).unwrap();
//! assert_eq!(recover_signer(&digest, &signature).unwrap(), signer.identity());
//! ```

pub mod digest;
pub mod domain;
pub mod encoder;
pub mod error;
pub mod identity;
pub mod serde_uint;
pub mod signature;

pub use digest::*;
pub use domain::*;
pub use encoder::*;
pub use error::*;
pub use identity::*;
pub use signature::*;

pub use alloy_primitives::{Bytes, U256};
