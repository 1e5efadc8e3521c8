#![warn(missing_docs)]

//! Delegated-authority invocation engine.
//!
//! A principal that holds authority over a [`ProtectedResource`] can hand that
//! authority to someone else by signing a [`Delegation`] off-line. The
//! delegate may delegate it further, and anyone at the end of such a chain can
//! sign an [`InvocationBatch`] that the [`Dispatcher`] executes as if the root
//! authority had called the resource itself.
//!
//! Before a payload reaches the resource the engine checks that:
//!
//! - the batch nonce is the next one in its queue ([`ReplayLedger`]),
//! - every link is signed by the delegate of the link above it and names its
//!   parent by digest, ending at the resource's root authority
//!   ([`ChainValidator`]),
//! - every caveat of every link holds ([`EnforcerRegistry`]), including
//!   revocation ([`RevocationRegistry`]).
//!
//! # Example
//!
//! ```rust
//! use delegatable::{
//!     CallContext, Delegation, Dispatcher, EngineConfig, Invocation, InvocationBatch,
//!     ProtectedResource, ReplayProtection, ResourceError, Transaction,
//! };
//! use delegatable::storage::{MemoryStore, StateTransaction, Store};
//! use delegatable::typed_data::{DomainContext, Identity, Principal, Secp256k1Signer, U256};
//!
//! struct Echo;
//!
//! impl Principal for Echo {
//!     fn identity(&self) -> Identity {
//!         Identity::from([0xec; 20])
//!     }
//! }
//!
//! impl ProtectedResource for Echo {
//!     fn execute<S: Store + ?Sized>(
//!         &self,
//!         context: &CallContext,
//!         _payload: &[u8],
//!         _state: &mut StateTransaction<'_, S>,
//!     ) -> Result<Vec<u8>, ResourceError> {
//!         Ok(context.sender.as_bytes().to_vec())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let domain = DomainContext::new("Echo", 1, Echo.identity());
//! let config = EngineConfig::new(domain.clone(), Identity::from([0xee; 20]));
//! let dispatcher = Dispatcher::new(config, Echo, MemoryStore::default()).unwrap();
//!
//! let owner = Secp256k1Signer::from_slice(&[1u8; 32]).unwrap();
//! let friend = Secp256k1Signer::from_slice(&[2u8; 32]).unwrap();
//!
//! let grant = Delegation::root(friend.identity()).sign(&owner, &domain).await.unwrap();
//! let batch = InvocationBatch::new(
//!     ReplayProtection::new(U256::from(1u64), U256::ZERO),
//!     vec![Invocation::new(Transaction::new(Echo.identity(), U256::ZERO, vec![]), vec![grant])],
//! )
//! .sign(&friend, &domain)
//! .await
//! .unwrap();
//!
//! let outcomes = dispatcher.dispatch(&[batch]).unwrap();
//! let output = outcomes[0].receipts()[0].result.clone().unwrap();
//! assert_eq!(output, owner.identity().as_bytes().to_vec());
//! # });
//! ```

mod caveat;
mod chain;
mod config;
mod delegation;
mod dispatch;
mod error;
mod invocation;
mod replay;
mod resource;
mod revocation;

pub use caveat::*;
pub use chain::*;
pub use config::*;
pub use delegation::*;
pub use dispatch::*;
pub use error::*;
pub use invocation::*;
pub use replay::*;
pub use resource::*;
pub use revocation::*;

pub use delegatable_storage as storage;
pub use delegatable_typed_data as typed_data;
