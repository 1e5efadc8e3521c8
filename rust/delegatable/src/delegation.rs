//! Delegations and their signed form.
//!
//! A [`Delegation`] grants its `delegate` the authority named by its
//! `authority` field: either [`Digest::ROOT`] (the signer's own authority)
//! or the [digest](SignedDelegation::digest) of the signed delegation the
//! signer itself received. Delegations are built and signed off-line and
//! travel as plain message data.

use alloy_primitives::Bytes;
use delegatable_typed_data::{
    Digest, DomainContext, Identity, RecoverableSignature, SignatureError, Signer,
    StructEncoder, TypedData, recover_signer, typed_digest,
};
use serde::{Deserialize, Serialize};

/// A condition attached to a delegation link.
///
/// `terms` are opaque to everything but the enforcer named by `enforcer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caveat {
    /// Reference of the enforcer evaluating this caveat.
    pub enforcer: Identity,
    /// Enforcer-specific configuration.
    pub terms: Bytes,
}

impl Caveat {
    /// Create a caveat for `enforcer` with `terms`.
    pub fn new(enforcer: Identity, terms: impl Into<Vec<u8>>) -> Self {
        Self {
            enforcer,
            terms: Bytes::from(terms.into()),
        }
    }
}

impl TypedData for Caveat {
    const TYPE: &'static str = "Caveat(address enforcer,bytes terms)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder.address(&self.enforcer).bytes(&self.terms);
    }
}

/// Grant of authority to a delegate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delegation {
    /// Who receives the authority.
    pub delegate: Identity,
    /// [`Digest::ROOT`] or the digest of the parent signed delegation.
    pub authority: Digest,
    /// Conditions that must all hold for this link to be usable.
    #[serde(default)]
    pub caveats: Vec<Caveat>,
}

impl Delegation {
    /// A delegation of the signer's own authority to `delegate`.
    pub fn root(delegate: Identity) -> Self {
        Self {
            delegate,
            authority: Digest::ROOT,
            caveats: Vec::new(),
        }
    }

    /// A re-delegation of the authority granted by `parent`.
    pub fn redelegate(delegate: Identity, parent: &SignedDelegation) -> Self {
        Self {
            delegate,
            authority: parent.digest(),
            caveats: Vec::new(),
        }
    }

    /// Attach a caveat.
    pub fn with_caveat(mut self, caveat: Caveat) -> Self {
        self.caveats.push(caveat);
        self
    }

    /// Sign this delegation under `domain`.
    pub async fn sign<S: Signer>(
        self,
        signer: &S,
        domain: &DomainContext,
    ) -> Result<SignedDelegation, SignatureError> {
        let signature = signer.sign(&domain.digest(&self)).await?;
        Ok(SignedDelegation {
            delegation: self,
            signature,
        })
    }
}

impl TypedData for Delegation {
    const TYPE: &'static str = "Delegation(address delegate,bytes32 authority,Caveat[] caveats)\
                                Caveat(address enforcer,bytes terms)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder
            .address(&self.delegate)
            .bytes32(&self.authority)
            .array(&self.caveats);
    }
}

/// A delegation together with its delegator's signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedDelegation {
    /// The signed delegation.
    pub delegation: Delegation,
    /// Signature of the delegator over the domain-bound delegation digest.
    pub signature: RecoverableSignature,
}

impl SignedDelegation {
    /// Domain-independent digest identifying this signed link.
    ///
    /// Child delegations name their parent by this digest and revocation
    /// records are keyed by it. The signature is part of the hash, so two
    /// delegators issuing identical delegations never share a digest.
    pub fn digest(&self) -> Digest {
        self.hash_struct()
    }

    /// Recover the delegator under `domain`.
    pub fn delegator(&self, domain: &DomainContext) -> Result<Identity, SignatureError> {
        self.delegator_under(&domain.separator())
    }

    /// Recover the delegator under the domain with the given separator.
    pub fn delegator_under(&self, separator: &Digest) -> Result<Identity, SignatureError> {
        recover_signer(&typed_digest(separator, &self.delegation), &self.signature)
    }
}

impl TypedData for SignedDelegation {
    const TYPE: &'static str = "SignedDelegation(Delegation delegation,bytes signature)\
                                Caveat(address enforcer,bytes terms)\
                                Delegation(address delegate,bytes32 authority,Caveat[] caveats)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder
            .structure(&self.delegation)
            .bytes(self.signature.as_bytes());
    }
}
