#![warn(missing_docs)]

//! State substrate for the delegated-authority engine.
//!
//! The engine keeps all of its persistent state (revocation records, replay
//! nonces, and whatever the protected resource stores) in a [`Store`]: a
//! key-value map that applies a set of writes atomically. Every engine
//! operation stages its writes in a [`StateTransaction`] and commits them in a
//! single step, so a failed operation never leaves partial state behind.
//!
//! [`MemoryStore`] is the in-process implementation; hosts that embed the
//! engine in a server or a deterministic execution substrate implement
//! [`Store`] over their own storage.

mod error;
pub use error::*;

mod key;
pub use key::*;

mod record;
pub use record::*;

mod store;
pub use store::*;

mod transaction;
pub use transaction::*;
