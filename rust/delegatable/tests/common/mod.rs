//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use delegatable::storage::{
    MemoryStore, StateKey, StateTransaction, Store, read_record,
};
use delegatable::typed_data::{DomainContext, Identity, Principal, Secp256k1Signer, U256};
use delegatable::{
    AllowedMethodsEnforcer, BatchPolicy, CallContext, Caveat, Delegation, Dispatcher,
    EngineConfig, EnforcerRegistry, Invocation, InvocationBatch, ProtectedResource,
    ReplayProtection, ResourceError, SignedDelegation, SignedInvocationBatch, Transaction,
};

/// Identity of the counter resource.
pub const RESOURCE: Identity = Identity::new([0xc0; 20]);
/// Identity caveats use for the revocation registry.
pub const REVOCATIONS: Identity = Identity::new([0xee; 20]);
/// Identity caveats use for the allowed-methods enforcer.
pub const METHODS: Identity = Identity::new([0xa1; 20]);

/// Selector adding one to the sender's count.
pub const INCREMENT: [u8; 4] = [0xd0, 0x9d, 0xe0, 0x8a];
/// Selector resetting the sender's count.
pub const RESET: [u8; 4] = [0xd8, 0x26, 0xf8, 0x8f];
/// Selector the counter always refuses.
pub const FAIL: [u8; 4] = [0xa9, 0xcc, 0x47, 0x18];

/// A per-sender counter.
///
/// When `owner` is set the owner is the only root authority it accepts.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    pub owner: Option<Identity>,
}

impl Counter {
    fn key(sender: &Identity) -> StateKey {
        StateKey::new("counter").push(sender)
    }
}

impl Principal for Counter {
    fn identity(&self) -> Identity {
        RESOURCE
    }
}

impl ProtectedResource for Counter {
    fn root_authority(
        &self,
        _state: &dyn delegatable::storage::StateView,
        origin: Identity,
    ) -> Result<Identity, ResourceError> {
        Ok(self.owner.unwrap_or(origin))
    }

    fn execute<S: Store + ?Sized>(
        &self,
        context: &CallContext,
        payload: &[u8],
        state: &mut StateTransaction<'_, S>,
    ) -> Result<Vec<u8>, ResourceError> {
        let key = Self::key(&context.sender);
        let selector = payload
            .get(..4)
            .ok_or_else(|| ResourceError::MalformedPayload("missing selector".into()))?;

        let count = match selector {
            s if s == INCREMENT => read_record::<u64, _>(&*state, &key)?.unwrap_or(0) + 1,
            s if s == RESET => 0,
            s if s == FAIL => return Err(ResourceError::Rejected("refused".into())),
            _ => return Err(ResourceError::MalformedPayload("unknown selector".into())),
        };

        state.write_record(&key, &count)?;
        Ok(count.to_be_bytes().to_vec())
    }
}

/// Deterministic signer for `seed`.
pub fn signer(seed: u8) -> Secp256k1Signer {
    Secp256k1Signer::from_slice(&[seed; 32]).unwrap()
}

/// Domain of the counter resource.
pub fn domain() -> DomainContext {
    DomainContext::new("Counter", 31337, RESOURCE)
}

/// Engine configuration for the counter resource.
pub fn config(policy: BatchPolicy) -> EngineConfig {
    EngineConfig::new(domain(), REVOCATIONS).with_batch_policy(policy)
}

/// A dispatcher guarding `counter` with every enforcer registered.
pub fn dispatcher_for(counter: Counter, policy: BatchPolicy) -> Dispatcher<Counter, MemoryStore> {
    Dispatcher::with_enforcers(
        config(policy),
        counter,
        MemoryStore::default(),
        EnforcerRegistry::new().with(METHODS, AllowedMethodsEnforcer),
    )
    .unwrap()
}

/// A dispatcher guarding an ownerless counter.
pub fn dispatcher() -> Dispatcher<Counter, MemoryStore> {
    dispatcher_for(Counter::default(), BatchPolicy::Independent)
}

/// Current count of `sender`.
pub fn count(dispatcher: &Dispatcher<Counter, MemoryStore>, sender: &Identity) -> u64 {
    read_record(dispatcher.store(), &Counter::key(sender))
        .unwrap()
        .unwrap_or(0)
}

/// A caveat subjecting a link to revocation.
pub fn revocable() -> Caveat {
    Caveat::new(REVOCATIONS, Vec::new())
}

/// Sign a chain from `signers[0]` down to `signers[last]`, returned leaf
/// first as invocations carry it. `caveats` are attached to every link.
pub async fn chain(signers: &[&Secp256k1Signer], caveats: &[Caveat]) -> Vec<SignedDelegation> {
    let mut links: Vec<SignedDelegation> = Vec::new();

    for pair in signers.windows(2) {
        let (delegator, delegate) = (pair[0], pair[1]);
        let mut delegation = match links.first() {
            Some(parent) => Delegation::redelegate(delegate.identity(), parent),
            None => Delegation::root(delegate.identity()),
        };
        for caveat in caveats {
            delegation = delegation.with_caveat(caveat.clone());
        }
        let signed = delegation.sign(delegator, &domain()).await.unwrap();
        links.insert(0, signed);
    }

    links
}

/// An invocation of `selector` on the counter under `authority`.
pub fn invoke(selector: [u8; 4], authority: Vec<SignedDelegation>) -> Invocation {
    Invocation::new(Transaction::new(RESOURCE, U256::ZERO, selector.to_vec()), authority)
}

/// `value` as a message integer.
pub fn uint(value: u64) -> U256 {
    U256::from(value)
}

/// Sign `invocations` as one batch.
pub async fn batch(
    invoker: &Secp256k1Signer,
    nonce: u64,
    queue: u64,
    invocations: Vec<Invocation>,
) -> SignedInvocationBatch {
    InvocationBatch::new(ReplayProtection::new(uint(nonce), uint(queue)), invocations)
        .sign(invoker, &domain())
        .await
        .unwrap()
}
