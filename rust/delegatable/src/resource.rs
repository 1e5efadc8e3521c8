//! Binding between the engine and the resource it guards.

use alloy_primitives::U256;
use delegatable_storage::{StateTransaction, StateView, Store};
use delegatable_typed_data::{Identity, Principal};

use crate::ResourceError;

/// Who an operation is performed for.
///
/// For a delegated invocation `sender` is the root authority of the chain
/// and `invoker` is whoever signed the batch. For a direct call both are the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Effective identity the operation is attributed to.
    pub sender: Identity,
    /// Identity that submitted the operation.
    pub invoker: Identity,
    /// Resource bound requested by the invoker; `None` means unbounded.
    pub gas_limit: Option<U256>,
}

impl CallContext {
    /// Context of a direct call by `caller`.
    pub fn direct(caller: Identity) -> Self {
        Self {
            sender: caller,
            invoker: caller,
            gas_limit: None,
        }
    }
}

/// A resource whose operations can be invoked through delegated authority.
///
/// The resource's [`Principal::identity`] is the verifying resource of the
/// domain every message is signed for, and the target every transaction must
/// name.
pub trait ProtectedResource: Principal + Send + Sync {
    /// The root authority a chain originating at `origin` must have.
    ///
    /// A resource owned by a single principal returns that principal, which
    /// rejects every chain not rooted at it. The default accepts any origin
    /// and leaves authorization of the effective sender to
    /// [`ProtectedResource::execute`].
    fn root_authority(
        &self,
        state: &dyn StateView,
        origin: Identity,
    ) -> Result<Identity, ResourceError> {
        let _ = state;
        Ok(origin)
    }

    /// Perform the operation encoded in `payload` on behalf of
    /// `context.sender`.
    ///
    /// Writes go to `state`; they are discarded if this returns an error.
    fn execute<S: Store + ?Sized>(
        &self,
        context: &CallContext,
        payload: &[u8],
        state: &mut StateTransaction<'_, S>,
    ) -> Result<Vec<u8>, ResourceError>;
}
