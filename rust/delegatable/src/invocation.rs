//! Invocations and the signed batches that carry them.

use alloy_primitives::{Bytes, U256};
use delegatable_typed_data::{
    Digest, DomainContext, Identity, RecoverableSignature, SignatureError, Signer,
    StructEncoder, TypedData, recover_signer, serde_uint, typed_digest,
};
use serde::{Deserialize, Serialize};

use crate::SignedDelegation;

/// The operation an invocation asks the resource to perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// Resource the payload is addressed to.
    #[serde(rename = "to")]
    pub target: Identity,
    /// Upper bound on the resources the operation may consume; zero means
    /// unbounded.
    #[serde(rename = "gasLimit", with = "serde_uint")]
    pub gas_limit: U256,
    /// Opaque call payload, handed to the resource unmodified.
    #[serde(rename = "data")]
    pub payload: Bytes,
}

impl Transaction {
    /// A transaction carrying `payload` to `target`.
    pub fn new(target: Identity, gas_limit: U256, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            target,
            gas_limit,
            payload: Bytes::from(payload.into()),
        }
    }
}

impl TypedData for Transaction {
    const TYPE: &'static str = "Transaction(address to,uint256 gasLimit,bytes data)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder
            .address(&self.target)
            .uint(&self.gas_limit)
            .bytes(&self.payload);
    }
}

/// A transaction together with the chain of authority it is performed under.
///
/// `authority[0]` is the delegation granted to the batch signer and every
/// following entry is the parent of the one before it. An empty chain means
/// the batch signer acts on its own authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Invocation {
    /// What to perform.
    pub transaction: Transaction,
    /// Chain of signed delegations, leaf first.
    #[serde(default)]
    pub authority: Vec<SignedDelegation>,
}

impl Invocation {
    /// An invocation of `transaction` under `authority`.
    pub fn new(transaction: Transaction, authority: Vec<SignedDelegation>) -> Self {
        Self {
            transaction,
            authority,
        }
    }
}

impl TypedData for Invocation {
    const TYPE: &'static str = "Invocation(Transaction transaction,SignedDelegation[] authority)\
                                Caveat(address enforcer,bytes terms)\
                                Delegation(address delegate,bytes32 authority,Caveat[] caveats)\
                                SignedDelegation(Delegation delegation,bytes signature)\
                                Transaction(address to,uint256 gasLimit,bytes data)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder
            .structure(&self.transaction)
            .array(&self.authority);
    }
}

/// Position of a batch in its signer's nonce queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplayProtection {
    /// Must be exactly one more than the last nonce accepted on `queue`.
    #[serde(with = "serde_uint")]
    pub nonce: U256,
    /// Independent nonce lane.
    #[serde(with = "serde_uint")]
    pub queue: U256,
}

impl ReplayProtection {
    /// Replay protection for `nonce` on `queue`.
    pub fn new(nonce: U256, queue: U256) -> Self {
        Self { nonce, queue }
    }
}

impl TypedData for ReplayProtection {
    const TYPE: &'static str = "ReplayProtection(uint nonce,uint queue)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder.uint(&self.nonce).uint(&self.queue);
    }
}

/// An ordered group of invocations signed as a whole by one invoker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationBatch {
    /// Nonce and queue guarding the batch against replay.
    pub replay_protection: ReplayProtection,
    /// Invocations, executed in order.
    pub batch: Vec<Invocation>,
}

impl InvocationBatch {
    /// A batch of `batch` guarded by `replay_protection`.
    pub fn new(replay_protection: ReplayProtection, batch: Vec<Invocation>) -> Self {
        Self {
            replay_protection,
            batch,
        }
    }

    /// Sign this batch under `domain`.
    pub async fn sign<S: Signer>(
        self,
        signer: &S,
        domain: &DomainContext,
    ) -> Result<SignedInvocationBatch, SignatureError> {
        let signature = signer.sign(&domain.digest(&self)).await?;
        Ok(SignedInvocationBatch {
            signature,
            invocations: self,
        })
    }
}

impl TypedData for InvocationBatch {
    const TYPE: &'static str = "Invocations(Invocation[] batch,ReplayProtection replayProtection)\
                                Caveat(address enforcer,bytes terms)\
                                Delegation(address delegate,bytes32 authority,Caveat[] caveats)\
                                Invocation(Transaction transaction,SignedDelegation[] authority)\
                                ReplayProtection(uint nonce,uint queue)\
                                SignedDelegation(Delegation delegation,bytes signature)\
                                Transaction(address to,uint256 gasLimit,bytes data)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder
            .array(&self.batch)
            .structure(&self.replay_protection);
    }
}

/// A batch together with its invoker's signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedInvocationBatch {
    /// Signature of the invoker over the domain-bound batch digest.
    pub signature: RecoverableSignature,
    /// The signed batch.
    pub invocations: InvocationBatch,
}

impl SignedInvocationBatch {
    /// Recover the invoker under `domain`.
    pub fn invoker(&self, domain: &DomainContext) -> Result<Identity, SignatureError> {
        self.invoker_under(&domain.separator())
    }

    /// Recover the invoker under the domain with the given separator.
    pub fn invoker_under(&self, separator: &Digest) -> Result<Identity, SignatureError> {
        recover_signer(&typed_digest(separator, &self.invocations), &self.signature)
    }
}
