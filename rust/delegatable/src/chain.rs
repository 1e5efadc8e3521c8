//! Authority chain validation.
//!
//! An invocation's `authority` is walked leaf first. Link `i` must be
//! delegated to the party exercising it (the batch signer for link 0, the
//! signer of link `i - 1` otherwise) and must name the digest of link `i + 1`
//! as its authority, the last link naming [`Digest::ROOT`]. The signer of
//! the last link is the chain's origin, which must be the resource's root
//! authority. Once the links are known to be connected, the caveats of every
//! link are evaluated in order.

use delegatable_storage::StateView;
use delegatable_typed_data::{Digest, DomainContext, Identity};

use crate::{AuthorityError, CaveatError, EnforcerRegistry, Invocation, SignedDelegation};

/// Default upper bound on the number of links in a chain.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 16;

/// Validates authority chains for one domain.
#[derive(Debug, Clone)]
pub struct ChainValidator {
    separator: Digest,
    enforcers: EnforcerRegistry,
    max_depth: usize,
}

impl ChainValidator {
    /// A validator for links signed under `domain`.
    pub fn new(domain: &DomainContext, enforcers: EnforcerRegistry) -> Self {
        Self {
            separator: domain.separator(),
            enforcers,
            max_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    /// Replace the maximum chain depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The registered caveat enforcers.
    pub fn enforcers(&self) -> &EnforcerRegistry {
        &self.enforcers
    }

    /// Verify `invocation`'s chain for `invoker` and return its origin.
    ///
    /// The origin is the signer of the last link, or `invoker` itself when
    /// the chain is empty.
    pub fn resolve(
        &self,
        invocation: &Invocation,
        invoker: Identity,
        state: &dyn StateView,
    ) -> Result<Identity, AuthorityError> {
        let chain = &invocation.authority;
        if chain.len() > self.max_depth {
            return Err(AuthorityError::ChainTooDeep {
                depth: chain.len(),
                max: self.max_depth,
            });
        }

        let origin = self.connect(chain, invoker)?;
        self.enforce(invocation, state)?;

        tracing::trace!(%invoker, %origin, depth = chain.len(), "authority chain resolved");
        Ok(origin)
    }

    /// Verify that `invocation`'s chain grants `invoker` the authority of
    /// `root_authority`.
    pub fn validate(
        &self,
        invocation: &Invocation,
        root_authority: Identity,
        invoker: Identity,
        state: &dyn StateView,
    ) -> Result<(), AuthorityError> {
        let origin = self.resolve(invocation, invoker, state)?;
        if origin != root_authority {
            return Err(AuthorityError::RootAuthorityMismatch {
                expected: root_authority,
                found: origin,
            });
        }
        Ok(())
    }

    fn connect(
        &self,
        chain: &[SignedDelegation],
        invoker: Identity,
    ) -> Result<Identity, AuthorityError> {
        let mut holder = invoker;

        for (link, signed) in chain.iter().enumerate() {
            let delegation = &signed.delegation;
            if delegation.delegate != holder {
                return Err(AuthorityError::DelegateMismatch {
                    link,
                    expected: holder,
                    found: delegation.delegate,
                });
            }

            let parent = match chain.get(link + 1) {
                Some(next) => next.digest(),
                None => Digest::ROOT,
            };
            if delegation.authority != parent {
                return Err(AuthorityError::ChainLinkageMismatch {
                    link,
                    expected: parent,
                    found: delegation.authority,
                });
            }

            holder = signed
                .delegator_under(&self.separator)
                .map_err(|source| AuthorityError::InvalidLinkSignature { link, source })?;
            tracing::trace!(link, delegator = %holder, "link verified");
        }

        Ok(holder)
    }

    fn enforce(&self, invocation: &Invocation, state: &dyn StateView) -> Result<(), AuthorityError> {
        for (link, signed) in invocation.authority.iter().enumerate() {
            if signed.delegation.caveats.is_empty() {
                continue;
            }

            let digest = signed.digest();
            for caveat in &signed.delegation.caveats {
                let enforcer = self.enforcers.get(&caveat.enforcer).ok_or(
                    AuthorityError::UnknownEnforcer {
                        enforcer: caveat.enforcer,
                        link,
                    },
                )?;

                enforcer
                    .enforce(&caveat.terms, invocation, &digest, state)
                    .map_err(|error| match error {
                        CaveatError::Revoked => AuthorityError::Revoked {
                            link,
                            delegation: digest,
                        },
                        CaveatError::Rejected(reason) => AuthorityError::CaveatRejected {
                            enforcer: caveat.enforcer,
                            link,
                            reason,
                        },
                        CaveatError::Storage(error) => AuthorityError::Storage(error),
                    })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllowedMethodsEnforcer, Caveat, Delegation, Transaction};
    use alloy_primitives::U256;
    use delegatable_storage::MemoryStore;
    use delegatable_typed_data::{Principal, Secp256k1Signer};
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    const UNREGISTERED: Identity = Identity::NULL;

    fn domain() -> DomainContext {
        DomainContext::new("Chains", 1, Identity::from([9u8; 20]))
    }

    fn signer(seed: u8) -> Secp256k1Signer {
        Secp256k1Signer::from_slice(&[seed; 32]).unwrap()
    }

    fn validator() -> ChainValidator {
        let methods = Identity::from([0xa1; 20]);
        ChainValidator::new(
            &domain(),
            EnforcerRegistry::new().with(methods, AllowedMethodsEnforcer),
        )
    }

    fn invocation(authority: Vec<SignedDelegation>) -> Invocation {
        Invocation::new(
            Transaction::new(domain().verifying_resource, U256::ZERO, vec![1, 2, 3, 4]),
            authority,
        )
    }

    #[test]
    fn it_resolves_an_empty_chain_to_the_invoker() -> TestResult {
        let invoker = signer(1).identity();
        let store = MemoryStore::default();

        assert_eq!(validator().resolve(&invocation(vec![]), invoker, &store)?, invoker);
        validator().validate(&invocation(vec![]), invoker, invoker, &store)?;
        assert!(matches!(
            validator().validate(&invocation(vec![]), signer(2).identity(), invoker, &store),
            Err(AuthorityError::RootAuthorityMismatch { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn it_resolves_a_two_link_chain_to_its_origin() -> TestResult {
        let (root, middle, leaf) = (signer(1), signer(2), signer(3));
        let first = Delegation::root(middle.identity()).sign(&root, &domain()).await?;
        let second = Delegation::redelegate(leaf.identity(), &first)
            .sign(&middle, &domain())
            .await?;

        let origin = validator().resolve(
            &invocation(vec![second, first]),
            leaf.identity(),
            &MemoryStore::default(),
        )?;
        assert_eq!(origin, root.identity());
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_links_in_the_wrong_order() -> TestResult {
        let (root, middle, leaf) = (signer(1), signer(2), signer(3));
        let first = Delegation::root(middle.identity()).sign(&root, &domain()).await?;
        let second = Delegation::redelegate(leaf.identity(), &first)
            .sign(&middle, &domain())
            .await?;

        let result = validator().resolve(
            &invocation(vec![first, second]),
            leaf.identity(),
            &MemoryStore::default(),
        );
        assert!(matches!(
            result,
            Err(AuthorityError::DelegateMismatch { link: 0, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_a_link_used_by_someone_else() -> TestResult {
        let link = Delegation::root(signer(2).identity())
            .sign(&signer(1), &domain())
            .await?;

        let result = validator().resolve(
            &invocation(vec![link]),
            signer(3).identity(),
            &MemoryStore::default(),
        );
        assert_eq!(
            result,
            Err(AuthorityError::DelegateMismatch {
                link: 0,
                expected: signer(3).identity(),
                found: signer(2).identity(),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_a_leaf_that_claims_the_root() -> TestResult {
        let (root, middle, leaf) = (signer(1), signer(2), signer(3));
        let first = Delegation::root(middle.identity()).sign(&root, &domain()).await?;
        let detached = Delegation::root(leaf.identity())
            .sign(&middle, &domain())
            .await?;

        let result = validator().resolve(
            &invocation(vec![detached, first]),
            leaf.identity(),
            &MemoryStore::default(),
        );
        assert!(matches!(
            result,
            Err(AuthorityError::ChainLinkageMismatch { link: 0, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn it_enforces_the_depth_limit() -> TestResult {
        let link = Delegation::root(signer(2).identity())
            .sign(&signer(1), &domain())
            .await?;

        let result = validator().with_max_depth(0).resolve(
            &invocation(vec![link]),
            signer(2).identity(),
            &MemoryStore::default(),
        );
        assert_eq!(result, Err(AuthorityError::ChainTooDeep { depth: 1, max: 0 }));
        Ok(())
    }

    #[tokio::test]
    async fn it_reports_the_rejecting_caveat() -> TestResult {
        let methods = Identity::from([0xa1; 20]);
        let link = Delegation::root(signer(2).identity())
            .with_caveat(Caveat::new(
                methods,
                AllowedMethodsEnforcer::terms([&[9, 9, 9, 9]]),
            ))
            .sign(&signer(1), &domain())
            .await?;

        let result = validator().resolve(
            &invocation(vec![link]),
            signer(2).identity(),
            &MemoryStore::default(),
        );
        assert!(matches!(
            result,
            Err(AuthorityError::CaveatRejected { enforcer, link: 0, .. }) if enforcer == methods
        ));
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_unknown_enforcers() -> TestResult {
        let link = Delegation::root(signer(2).identity())
            .with_caveat(Caveat::new(UNREGISTERED, vec![]))
            .sign(&signer(1), &domain())
            .await?;

        let result = validator().resolve(
            &invocation(vec![link]),
            signer(2).identity(),
            &MemoryStore::default(),
        );
        assert_eq!(
            result,
            Err(AuthorityError::UnknownEnforcer {
                enforcer: UNREGISTERED,
                link: 0,
            })
        );
        Ok(())
    }
}
