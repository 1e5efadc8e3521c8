use delegatable_storage::StateView;
use delegatable_typed_data::Digest;

use crate::{CaveatEnforcer, CaveatError, Invocation};

/// Length of a method selector at the start of a payload.
pub const SELECTOR_SIZE: usize = 4;

/// Restricts a link to payloads starting with one of the listed selectors.
///
/// Terms are the allowed 4-byte selectors, concatenated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowedMethodsEnforcer;

impl AllowedMethodsEnforcer {
    /// Encode `selectors` as caveat terms.
    pub fn terms<'a>(selectors: impl IntoIterator<Item = &'a [u8; SELECTOR_SIZE]>) -> Vec<u8> {
        selectors.into_iter().flatten().copied().collect()
    }
}

impl CaveatEnforcer for AllowedMethodsEnforcer {
    fn enforce(
        &self,
        terms: &[u8],
        invocation: &Invocation,
        _delegation: &Digest,
        _state: &dyn StateView,
    ) -> Result<(), CaveatError> {
        if terms.len() % SELECTOR_SIZE != 0 {
            return Err(CaveatError::Rejected(format!(
                "terms of {} bytes are not a list of selectors",
                terms.len()
            )));
        }

        let Some(selector) = invocation.transaction.payload.get(..SELECTOR_SIZE) else {
            return Err(CaveatError::Rejected(
                "payload is shorter than a selector".into(),
            ));
        };

        if terms
            .chunks_exact(SELECTOR_SIZE)
            .any(|allowed| allowed == selector)
        {
            Ok(())
        } else {
            Err(CaveatError::Rejected(format!(
                "method {selector:02x?} is not allowed"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;
    use alloy_primitives::U256;
    use delegatable_storage::MemoryStore;
    use delegatable_typed_data::Identity;

    fn invocation(payload: &[u8]) -> Invocation {
        Invocation::new(Transaction::new(Identity::NULL, U256::ZERO, payload), vec![])
    }

    fn enforce(terms: &[u8], payload: &[u8]) -> Result<(), CaveatError> {
        AllowedMethodsEnforcer.enforce(
            terms,
            &invocation(payload),
            &Digest::ROOT,
            &MemoryStore::default(),
        )
    }

    #[test]
    fn it_allows_listed_selectors() {
        let terms = AllowedMethodsEnforcer::terms([&[1, 2, 3, 4], &[5, 6, 7, 8]]);
        assert!(enforce(&terms, &[5, 6, 7, 8, 0xff]).is_ok());
        assert!(enforce(&terms, &[1, 2, 3, 4]).is_ok());
    }

    #[test]
    fn it_refuses_other_selectors() {
        let terms = AllowedMethodsEnforcer::terms([&[1, 2, 3, 4]]);
        assert!(matches!(
            enforce(&terms, &[1, 2, 3, 5]),
            Err(CaveatError::Rejected(_))
        ));
        assert!(matches!(
            enforce(&terms, &[1, 2]),
            Err(CaveatError::Rejected(_))
        ));
    }

    #[test]
    fn it_refuses_malformed_terms() {
        assert!(matches!(
            enforce(&[1, 2, 3], &[1, 2, 3, 4]),
            Err(CaveatError::Rejected(_))
        ));
    }
}
