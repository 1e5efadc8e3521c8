//! Verifying-context binding for digests.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{Digest, Identity, StructEncoder, TypedData, keccak256_concat};

/// Default domain version string.
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// The context every digest is bound to.
///
/// Signing clients and the verifying engine must agree on every field;
/// a signature produced under any other context recovers to an unrelated
/// identity and is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainContext {
    /// Human readable deployment name.
    pub name: String,
    /// Deployment version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Identifier of the network/chain the resource lives on.
    pub network_id: u64,
    /// Identity of the protected resource that verifies signatures.
    pub verifying_resource: Identity,
}

fn default_version() -> String {
    DEFAULT_DOMAIN_VERSION.to_string()
}

impl DomainContext {
    /// Create a domain context with the default version.
    pub fn new(name: impl Into<String>, network_id: u64, verifying_resource: Identity) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            network_id,
            verifying_resource,
        }
    }

    /// Replace the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The domain separator: `hashStruct` of this context.
    pub fn separator(&self) -> Digest {
        self.hash_struct()
    }

    /// Digest of `message` bound to this domain.
    pub fn digest<T: TypedData>(&self, message: &T) -> Digest {
        typed_digest(&self.separator(), message)
    }
}

impl TypedData for DomainContext {
    const TYPE: &'static str =
        "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

    fn encode_fields(&self, encoder: &mut StructEncoder) {
        encoder
            .string(&self.name)
            .string(&self.version)
            .uint(&U256::from(self.network_id))
            .address(&self.verifying_resource);
    }
}

/// `keccak256(0x19 ‖ 0x01 ‖ separator ‖ hashStruct(message))`.
///
/// Use this form when only the separator of a foreign domain is known, as
/// when a revocation names the domain of the resource it applies to.
pub fn typed_digest<T: TypedData>(separator: &Digest, message: &T) -> Digest {
    let hash = message.hash_struct();
    keccak256_concat([
        b"\x19\x01".as_slice(),
        separator.as_bytes().as_slice(),
        hash.as_bytes().as_slice(),
    ])
}
