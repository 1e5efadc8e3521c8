//! Revocation of individual delegation links.
//!
//! Any delegator may revoke a link it signed. Records are keyed by the
//! link's [digest](SignedDelegation::digest), live in their own namespace of
//! the store and only ever go from "not revoked" to "revoked". Links opt in
//! to the check by carrying a caveat naming the registry's identity, which is
//! how [`RevocationRegistry`] takes part in chain validation as an ordinary
//! [`CaveatEnforcer`].

use delegatable_storage::{
    StateKey, StateTransaction, StateView, StorageError, Store, read_record,
};
use delegatable_typed_data::{Digest, Identity, Principal};
use serde::{Deserialize, Serialize};

use crate::{AuthorityError, Caveat, CaveatEnforcer, CaveatError, Invocation, SignedDelegation};

const NAMESPACE: &str = "revocation";

/// Persistent revocation state of one delegation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRecord {
    /// Whether the link has been revoked.
    pub revoked: bool,
    /// Delegator that revoked it.
    pub revoked_by: Identity,
}

/// Registry of revoked delegation links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationRegistry {
    identity: Identity,
}

impl RevocationRegistry {
    /// A registry that caveats refer to as `identity`.
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// A caveat subjecting a link to this registry.
    pub fn caveat(&self) -> Caveat {
        Caveat::new(self.identity, Vec::new())
    }

    fn key(&self, delegation: &Digest) -> StateKey {
        StateKey::new(NAMESPACE)
            .push(self.identity)
            .push(delegation)
    }

    /// The record stored for the link identified by `delegation`, if any.
    pub fn record<V: StateView + ?Sized>(
        &self,
        state: &V,
        delegation: &Digest,
    ) -> Result<Option<RevocationRecord>, StorageError> {
        read_record(state, &self.key(delegation))
    }

    /// Whether `signed` has been revoked.
    pub fn is_revoked<V: StateView + ?Sized>(
        &self,
        state: &V,
        signed: &SignedDelegation,
    ) -> Result<bool, StorageError> {
        Ok(self
            .record(state, &signed.digest())?
            .is_some_and(|record| record.revoked))
    }

    /// Stage the revocation of `signed` in `transaction`.
    ///
    /// The delegator is recovered under the domain whose separator is
    /// `domain`, which must be the domain the link was signed in. Only that
    /// delegator may revoke it. Revoking an already revoked link succeeds
    /// without writing anything.
    pub fn revoke<S: Store + ?Sized>(
        &self,
        transaction: &mut StateTransaction<'_, S>,
        caller: Identity,
        signed: &SignedDelegation,
        domain: &Digest,
    ) -> Result<(), AuthorityError> {
        let delegator = signed
            .delegator_under(domain)
            .map_err(AuthorityError::InvalidSignature)?;

        if caller != delegator {
            tracing::warn!(%caller, %delegator, "unauthorized revocation attempt");
            return Err(AuthorityError::Unauthorized { caller, delegator });
        }

        let digest = signed.digest();
        if self
            .record(&*transaction, &digest)?
            .is_some_and(|record| record.revoked)
        {
            tracing::debug!(delegation = %digest, "delegation already revoked");
            return Ok(());
        }

        transaction.write_record(
            &self.key(&digest),
            &RevocationRecord {
                revoked: true,
                revoked_by: caller,
            },
        )?;
        tracing::debug!(delegation = %digest, revoked_by = %caller, "delegation revoked");
        Ok(())
    }

    /// Revoke `signed` in a transaction of its own on `store`.
    pub fn revoke_delegation<S: Store + ?Sized>(
        &self,
        store: &S,
        caller: Identity,
        signed: &SignedDelegation,
        domain: &Digest,
    ) -> Result<(), AuthorityError> {
        let mut transaction = StateTransaction::new(store);
        self.revoke(&mut transaction, caller, signed, domain)?;
        transaction.commit()?;
        Ok(())
    }
}

impl Principal for RevocationRegistry {
    fn identity(&self) -> Identity {
        self.identity
    }
}

impl CaveatEnforcer for RevocationRegistry {
    fn enforce(
        &self,
        _terms: &[u8],
        _invocation: &Invocation,
        delegation: &Digest,
        state: &dyn StateView,
    ) -> Result<(), CaveatError> {
        match self.record(state, delegation)? {
            Some(record) if record.revoked => Err(CaveatError::Revoked),
            _ => Ok(()),
        }
    }
}
