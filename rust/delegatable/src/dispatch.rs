//! The public entry point of the engine.
//!
//! A [`Dispatcher`] owns one protected resource and the store holding its
//! state, revocation records and nonce queues. Every state-changing call
//! takes the dispatcher's lock and runs inside a single
//! [`StateTransaction`], so concurrent callers observe dispatches one at a
//! time and a dispatch either commits as a whole or not at all.
//!
//! Inside a dispatch each batch is handled in order:
//!
//! 1. the invoker is recovered from the batch signature,
//! 2. the batch nonce is consumed; this write survives any later failure
//!    of the batch's invocations,
//! 3. every invocation's authority chain is resolved and checked against
//!    the resource's root authority,
//! 4. the payload is executed with the root authority as effective sender.
//!
//! A failed invocation is undone and reported in its [`Receipt`]. Under
//! [`BatchPolicy::Atomic`] it also undoes the rest of its batch.

use alloy_primitives::U256;
use delegatable_storage::{StateTransaction, StorageError, Store};
use delegatable_typed_data::{Digest, DomainContext, Identity, Principal};
use parking_lot::Mutex;

use crate::{
    AuthorityError, BatchPolicy, CallContext, ChainValidator, ConfigError, EngineConfig,
    EnforcerRegistry, Invocation, ProtectedResource, ReplayLedger, ResourceError,
    RevocationRegistry, ServiceError, SignedDelegation, SignedInvocationBatch,
};

/// Result of one invocation of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Position of the invocation in its batch.
    pub index: usize,
    /// Resource output, or why the invocation had no effect.
    pub result: Result<Vec<u8>, AuthorityError>,
}

impl Receipt {
    /// Whether the invocation took effect.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The failure classified for a host surface, if the invocation failed.
    pub fn service_error(&self) -> Option<ServiceError> {
        self.result.as_ref().err().cloned().map(ServiceError::from)
    }
}

/// Result of one signed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch was refused before any invocation ran.
    Rejected {
        /// Recovered invoker, when the signature was usable.
        invoker: Option<Identity>,
        /// Why the batch was refused.
        error: AuthorityError,
    },
    /// The batch's nonce was consumed and its invocations attempted.
    Executed {
        /// Signer of the batch.
        invoker: Identity,
        /// One receipt per invocation, in batch order.
        receipts: Vec<Receipt>,
    },
}

impl BatchOutcome {
    /// Signer of the batch, when known.
    pub fn invoker(&self) -> Option<Identity> {
        match self {
            BatchOutcome::Rejected { invoker, .. } => *invoker,
            BatchOutcome::Executed { invoker, .. } => Some(*invoker),
        }
    }

    /// Why the whole batch was refused, if it was.
    pub fn error(&self) -> Option<&AuthorityError> {
        match self {
            BatchOutcome::Rejected { error, .. } => Some(error),
            BatchOutcome::Executed { .. } => None,
        }
    }

    /// Receipts of the attempted invocations.
    pub fn receipts(&self) -> &[Receipt] {
        match self {
            BatchOutcome::Rejected { .. } => &[],
            BatchOutcome::Executed { receipts, .. } => receipts,
        }
    }

    /// The refusal of the whole batch classified for a host surface.
    pub fn service_error(&self) -> Option<ServiceError> {
        self.error().cloned().map(ServiceError::from)
    }

    /// Whether every invocation of the batch took effect.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Executed { receipts, .. } if receipts.iter().all(Receipt::is_success))
    }
}

/// Executes delegated invocations against a protected resource.
#[derive(Debug)]
pub struct Dispatcher<R, S> {
    config: EngineConfig,
    separator: Digest,
    resource: R,
    store: S,
    validator: ChainValidator,
    revocations: RevocationRegistry,
    replay: ReplayLedger,
    lock: Mutex<()>,
}

impl<R, S> Dispatcher<R, S>
where
    R: ProtectedResource,
    S: Store,
{
    /// A dispatcher for `resource` whose only caveat is revocation.
    pub fn new(config: EngineConfig, resource: R, store: S) -> Result<Self, ConfigError> {
        Self::with_enforcers(config, resource, store, EnforcerRegistry::new())
    }

    /// A dispatcher for `resource` consulting `enforcers` for caveats.
    ///
    /// The revocation registry named by the configuration is registered
    /// alongside `enforcers`, which must not already use its identity.
    pub fn with_enforcers(
        config: EngineConfig,
        resource: R,
        store: S,
        mut enforcers: EnforcerRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if resource.identity() != config.domain.verifying_resource {
            return Err(ConfigError::ResourceMismatch {
                expected: config.domain.verifying_resource,
                found: resource.identity(),
            });
        }
        if enforcers.contains(&config.revocation_registry) {
            return Err(ConfigError::Invalid(format!(
                "enforcer registered under the revocation registry identity {}",
                config.revocation_registry
            )));
        }

        let revocations = RevocationRegistry::new(config.revocation_registry);
        enforcers.register(revocations.identity(), revocations);
        let validator = ChainValidator::new(&config.domain, enforcers)
            .with_max_depth(config.max_chain_depth);

        Ok(Self {
            separator: config.domain.separator(),
            config,
            resource,
            store,
            validator,
            revocations,
            replay: ReplayLedger,
            lock: Mutex::new(()),
        })
    }

    /// The configuration this dispatcher runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Domain every accepted message is signed in.
    pub fn domain(&self) -> &DomainContext {
        &self.config.domain
    }

    /// Separator of [`Dispatcher::domain`].
    pub fn domain_separator(&self) -> Digest {
        self.separator
    }

    /// The guarded resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The revocation registry consulted by revocation caveats.
    pub fn revocations(&self) -> &RevocationRegistry {
        &self.revocations
    }

    /// Run `batches` in order and commit their effects together.
    ///
    /// Authority failures are reported in the returned outcomes. An error is
    /// returned only when state could not be read or written, in which case
    /// nothing is committed.
    pub fn dispatch(
        &self,
        batches: &[SignedInvocationBatch],
    ) -> Result<Vec<BatchOutcome>, StorageError> {
        let _guard = self.lock.lock();
        let mut transaction = StateTransaction::new(&self.store);

        let mut outcomes = Vec::with_capacity(batches.len());
        for batch in batches {
            outcomes.push(self.run_batch(&mut transaction, batch)?);
        }

        transaction.commit()?;
        Ok(outcomes)
    }

    /// Execute `payload` with `caller` as the effective sender.
    ///
    /// This is how a principal acts on its own authority without signing a
    /// batch.
    pub fn call(&self, caller: Identity, payload: &[u8]) -> Result<Vec<u8>, AuthorityError> {
        let _guard = self.lock.lock();
        let mut transaction = StateTransaction::new(&self.store);

        let output = self
            .resource
            .execute(&CallContext::direct(caller), payload, &mut transaction)?;
        transaction.commit()?;

        tracing::debug!(%caller, "direct call executed");
        Ok(output)
    }

    /// Revoke `signed` on behalf of `caller`.
    ///
    /// `domain` is the separator of the domain the link was signed in.
    pub fn revoke_delegation(
        &self,
        caller: Identity,
        signed: &SignedDelegation,
        domain: &Digest,
    ) -> Result<(), AuthorityError> {
        let _guard = self.lock.lock();
        self.revocations
            .revoke_delegation(&self.store, caller, signed, domain)
    }

    /// Whether `signed` has been revoked.
    pub fn is_revoked(&self, signed: &SignedDelegation) -> Result<bool, StorageError> {
        self.revocations.is_revoked(&self.store, signed)
    }

    /// Last nonce accepted from `signer` on `queue`.
    pub fn last_nonce(&self, signer: &Identity, queue: &U256) -> Result<U256, StorageError> {
        self.replay.last_nonce(&self.store, signer, queue)
    }

    /// The nonce the next batch from `signer` on `queue` must carry.
    pub fn next_nonce(&self, signer: &Identity, queue: &U256) -> Result<U256, StorageError> {
        Ok(self
            .last_nonce(signer, queue)?
            .saturating_add(U256::from(1u64)))
    }

    fn run_batch(
        &self,
        transaction: &mut StateTransaction<'_, S>,
        signed: &SignedInvocationBatch,
    ) -> Result<BatchOutcome, StorageError> {
        let invoker = match signed.invoker_under(&self.separator) {
            Ok(invoker) => invoker,
            Err(error) => {
                tracing::warn!(%error, "batch rejected");
                return Ok(BatchOutcome::Rejected {
                    invoker: None,
                    error: AuthorityError::InvalidSignature(error),
                });
            }
        };

        let protection = &signed.invocations.replay_protection;
        if let Err(error) =
            self.replay
                .consume(transaction, &invoker, &protection.queue, &protection.nonce)
        {
            let error = surface(error)?;
            tracing::warn!(%invoker, %error, "batch rejected");
            return Ok(BatchOutcome::Rejected {
                invoker: Some(invoker),
                error,
            });
        }

        let batch = &signed.invocations.batch;
        let start = transaction.savepoint();
        let mut receipts = Vec::with_capacity(batch.len());

        for (index, invocation) in batch.iter().enumerate() {
            let savepoint = transaction.savepoint();
            match self.invoke(transaction, invoker, invocation) {
                Ok(output) => receipts.push(Receipt {
                    index,
                    result: Ok(output),
                }),
                Err(error) => {
                    let error = surface(error)?;
                    tracing::warn!(%invoker, index, %error, "invocation rejected");
                    transaction.rollback_to(savepoint);

                    if self.config.batch_policy == BatchPolicy::Atomic {
                        transaction.rollback_to(start);
                        return Ok(BatchOutcome::Executed {
                            invoker,
                            receipts: abort(batch.len(), index, error),
                        });
                    }

                    receipts.push(Receipt {
                        index,
                        result: Err(error),
                    });
                }
            }
        }

        Ok(BatchOutcome::Executed { invoker, receipts })
    }

    fn invoke(
        &self,
        transaction: &mut StateTransaction<'_, S>,
        invoker: Identity,
        invocation: &Invocation,
    ) -> Result<Vec<u8>, AuthorityError> {
        let call = &invocation.transaction;
        let resource = self.resource.identity();
        if call.target != resource {
            return Err(AuthorityError::TargetMismatch {
                expected: resource,
                found: call.target,
            });
        }

        let origin = self.validator.resolve(invocation, invoker, &*transaction)?;
        let root_authority = self.resource.root_authority(&*transaction, origin)?;
        if origin != root_authority {
            return Err(AuthorityError::RootAuthorityMismatch {
                expected: root_authority,
                found: origin,
            });
        }

        let context = CallContext {
            sender: root_authority,
            invoker,
            gas_limit: (!call.gas_limit.is_zero()).then_some(call.gas_limit),
        };
        let output = self.resource.execute(&context, &call.payload, transaction)?;

        tracing::debug!(
            %invoker,
            sender = %root_authority,
            depth = invocation.authority.len(),
            "invocation executed"
        );
        Ok(output)
    }
}

/// Split substrate failures, which abort the dispatch, from authority
/// failures, which are reported.
fn surface(error: AuthorityError) -> Result<AuthorityError, StorageError> {
    match error {
        AuthorityError::Storage(error) | AuthorityError::Resource(ResourceError::Storage(error)) => {
            Err(error)
        }
        error => Ok(error),
    }
}

fn abort(len: usize, failed: usize, error: AuthorityError) -> Vec<Receipt> {
    let mut error = Some(error);
    (0..len)
        .map(|index| Receipt {
            index,
            result: Err(match error.take_if(|_| index == failed) {
                Some(error) => error,
                None => AuthorityError::BatchAborted { failed },
            }),
        })
        .collect()
}
