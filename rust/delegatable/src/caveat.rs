//! Pluggable caveat enforcement.
//!
//! Every [`Caveat`](crate::Caveat) names the enforcer that understands its
//! terms. Enforcers are registered in an [`EnforcerRegistry`] under the
//! [`Identity`] caveats refer to them by, and new kinds of condition are added
//! simply by registering another implementation of [`CaveatEnforcer`].

mod allowed_methods;

pub use allowed_methods::*;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use delegatable_storage::StateView;
use delegatable_typed_data::{Digest, Identity};

use crate::{CaveatError, Invocation};

/// A condition check attached to delegation links.
pub trait CaveatEnforcer: Send + Sync {
    /// Decide whether `invocation` may use the link identified by
    /// `delegation`, given the caveat's `terms`.
    ///
    /// `state` reflects every write made earlier in the current dispatch.
    fn enforce(
        &self,
        terms: &[u8],
        invocation: &Invocation,
        delegation: &Digest,
        state: &dyn StateView,
    ) -> Result<(), CaveatError>;
}

/// Enforcers keyed by the reference caveats use to name them.
#[derive(Clone, Default)]
pub struct EnforcerRegistry {
    enforcers: HashMap<Identity, Arc<dyn CaveatEnforcer>>,
}

impl EnforcerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `enforcer` under `reference`, replacing any previous one.
    pub fn register(&mut self, reference: Identity, enforcer: impl CaveatEnforcer + 'static) {
        self.enforcers.insert(reference, Arc::new(enforcer));
    }

    /// Builder form of [`EnforcerRegistry::register`].
    pub fn with(mut self, reference: Identity, enforcer: impl CaveatEnforcer + 'static) -> Self {
        self.register(reference, enforcer);
        self
    }

    /// The enforcer registered under `reference`.
    pub fn get(&self, reference: &Identity) -> Option<&Arc<dyn CaveatEnforcer>> {
        self.enforcers.get(reference)
    }

    /// Whether an enforcer is registered under `reference`.
    pub fn contains(&self, reference: &Identity) -> bool {
        self.enforcers.contains_key(reference)
    }
}

impl fmt::Debug for EnforcerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.enforcers.keys()).finish()
    }
}
