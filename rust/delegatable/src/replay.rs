//! Multi-queue nonce ledger.
//!
//! Every signer owns an unbounded number of independent queues. A batch on a
//! queue is accepted only when its nonce is exactly one more than the last
//! nonce accepted on that queue, so batches on one queue execute strictly in
//! order while different queues never block each other.

use alloy_primitives::U256;
use delegatable_storage::{StateKey, StateTransaction, StateView, StorageError, Store, read_record};
use delegatable_typed_data::Identity;

use crate::AuthorityError;

const NAMESPACE: &str = "replay";

/// Last accepted nonce per `(signer, queue)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayLedger;

impl ReplayLedger {
    fn key(signer: &Identity, queue: &U256) -> StateKey {
        StateKey::new(NAMESPACE)
            .push(signer)
            .push(queue.to_be_bytes::<32>())
    }

    /// Last nonce accepted for `signer` on `queue`, zero when none was.
    pub fn last_nonce<V: StateView + ?Sized>(
        &self,
        state: &V,
        signer: &Identity,
        queue: &U256,
    ) -> Result<U256, StorageError> {
        Ok(read_record(state, &Self::key(signer, queue))?.unwrap_or_default())
    }

    /// Accept `nonce` for `signer` on `queue` and record it in `transaction`.
    pub fn consume<S: Store + ?Sized>(
        &self,
        transaction: &mut StateTransaction<'_, S>,
        signer: &Identity,
        queue: &U256,
        nonce: &U256,
    ) -> Result<(), AuthorityError> {
        let last = self.last_nonce(&*transaction, signer, queue)?;
        // The queue is exhausted once its last nonce is U256::MAX.
        let Some(expected) = last.checked_add(U256::from(1u64)) else {
            return Err(AuthorityError::ReplayRejected {
                signer: *signer,
                queue: *queue,
                expected: last,
                found: *nonce,
            });
        };

        if *nonce != expected {
            tracing::warn!(%signer, %queue, %expected, found = %nonce, "nonce rejected");
            return Err(AuthorityError::ReplayRejected {
                signer: *signer,
                queue: *queue,
                expected,
                found: *nonce,
            });
        }

        transaction.write_record(&Self::key(signer, queue), nonce)?;
        tracing::debug!(%signer, %queue, %nonce, "nonce consumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegatable_storage::MemoryStore;
    use proptest::prelude::*;
    use testresult::TestResult;

    fn consume(store: &MemoryStore, signer: &Identity, queue: u64, nonce: u64) -> Result<(), AuthorityError> {
        consume_wide(store, signer, U256::from(queue), U256::from(nonce))
    }

    fn consume_wide(store: &MemoryStore, signer: &Identity, queue: U256, nonce: U256) -> Result<(), AuthorityError> {
        let mut transaction = StateTransaction::new(store);
        ReplayLedger.consume(&mut transaction, signer, &queue, &nonce)?;
        transaction.commit()?;
        Ok(())
    }

    fn last(store: &MemoryStore, signer: &Identity, queue: u64) -> Result<U256, StorageError> {
        ReplayLedger.last_nonce(store, signer, &U256::from(queue))
    }

    #[test]
    fn it_accepts_consecutive_nonces() -> TestResult {
        let store = MemoryStore::default();
        let signer = Identity::from([1u8; 20]);

        for nonce in 1..=3 {
            consume(&store, &signer, 0, nonce)?;
        }
        assert_eq!(last(&store, &signer, 0)?, U256::from(3u64));

        assert_eq!(
            consume(&store, &signer, 0, 2),
            Err(AuthorityError::ReplayRejected {
                signer,
                queue: U256::ZERO,
                expected: U256::from(4u64),
                found: U256::from(2u64),
            })
        );
        Ok(())
    }

    #[test]
    fn it_rejects_gaps() -> TestResult {
        let store = MemoryStore::default();
        let signer = Identity::from([1u8; 20]);

        consume(&store, &signer, 0, 1)?;
        assert!(matches!(
            consume(&store, &signer, 0, 3),
            Err(AuthorityError::ReplayRejected { expected, .. }) if expected == U256::from(2u64)
        ));
        assert_eq!(last(&store, &signer, 0)?, U256::from(1u64));
        Ok(())
    }

    #[test]
    fn it_rejects_zero_on_a_fresh_queue() {
        let store = MemoryStore::default();
        assert!(consume(&store, &Identity::from([1u8; 20]), 0, 0).is_err());
    }

    #[test]
    fn it_keeps_queues_and_signers_apart() -> TestResult {
        let store = MemoryStore::default();
        let alice = Identity::from([1u8; 20]);
        let bob = Identity::from([2u8; 20]);

        consume(&store, &alice, 0, 1)?;
        consume(&store, &alice, 7, 1)?;
        consume(&store, &bob, 0, 1)?;
        consume(&store, &alice, 0, 2)?;

        assert_eq!(last(&store, &alice, 0)?, U256::from(2u64));
        assert_eq!(last(&store, &alice, 7)?, U256::from(1u64));
        assert_eq!(last(&store, &bob, 0)?, U256::from(1u64));
        assert_eq!(last(&store, &bob, 7)?, U256::ZERO);
        Ok(())
    }

    #[test]
    fn it_keeps_queues_beyond_64_bits_apart() -> TestResult {
        let store = MemoryStore::default();
        let signer = Identity::from([3u8; 20]);
        let wide = U256::from(u64::MAX) + U256::from(1u64);

        consume_wide(&store, &signer, wide, U256::from(1u64))?;
        consume_wide(&store, &signer, wide, U256::from(2u64))?;

        assert_eq!(ReplayLedger.last_nonce(&store, &signer, &wide)?, U256::from(2u64));
        assert_eq!(last(&store, &signer, 0)?, U256::ZERO);
        Ok(())
    }

    #[test]
    fn it_refuses_to_wrap_an_exhausted_queue() -> TestResult {
        let store = MemoryStore::default();
        let signer = Identity::from([4u8; 20]);
        let queue = U256::from(9u64);
        store.commit(vec![(
            ReplayLedger::key(&signer, &queue).into(),
            delegatable_storage::encode_record(&U256::MAX)?,
        )])?;

        assert!(matches!(
            consume_wide(&store, &signer, queue, U256::ZERO),
            Err(AuthorityError::ReplayRejected { expected, .. }) if expected == U256::MAX
        ));
        Ok(())
    }

    proptest! {
        #[test]
        fn it_never_accepts_a_nonce_twice(nonces in proptest::collection::vec(0u64..8, 1..32)) {
            let store = MemoryStore::default();
            let signer = Identity::from([5u8; 20]);
            let mut accepted = Vec::new();

            for nonce in nonces {
                if consume(&store, &signer, 0, nonce).is_ok() {
                    accepted.push(nonce);
                }
            }

            let expected: Vec<u64> = (1..=accepted.len() as u64).collect();
            prop_assert_eq!(accepted, expected);
        }
    }
}
