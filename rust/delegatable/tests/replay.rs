//! Nonce queues as seen through the dispatcher.

mod common;

use common::*;
use delegatable::AuthorityError;
use delegatable::typed_data::Principal;
use testresult::TestResult;

#[test_log::test(tokio::test)]
async fn it_accepts_nonces_in_order_only() -> TestResult {
    let dispatcher = dispatcher();
    let owner = signer(1);
    let id = owner.identity();

    for nonce in 1..=3 {
        let outcome = dispatcher.dispatch(&[batch(&owner, nonce, 0, vec![invoke(INCREMENT, vec![])]).await])?;
        assert!(outcome[0].is_success(), "nonce {nonce} was refused");
    }
    assert_eq!(count(&dispatcher, &id), 3);

    let replayed = dispatcher.dispatch(&[batch(&owner, 2, 0, vec![invoke(INCREMENT, vec![])]).await])?;
    assert_eq!(
        replayed[0].error(),
        Some(&AuthorityError::ReplayRejected {
            signer: id,
            queue: uint(0),
            expected: uint(4),
            found: uint(2),
        })
    );
    assert!(replayed[0].receipts().is_empty());
    assert_eq!(count(&dispatcher, &id), 3);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_rejects_a_skipped_nonce() -> TestResult {
    let dispatcher = dispatcher();
    let owner = signer(1);

    let outcomes = dispatcher.dispatch(&[
        batch(&owner, 1, 0, vec![invoke(INCREMENT, vec![])]).await,
        batch(&owner, 3, 0, vec![invoke(INCREMENT, vec![])]).await,
    ])?;

    assert!(outcomes[0].is_success());
    assert!(matches!(
        outcomes[1].error(),
        Some(AuthorityError::ReplayRejected { expected, found, .. })
            if *expected == uint(2) && *found == uint(3)
    ));
    assert_eq!(dispatcher.next_nonce(&owner.identity(), &uint(0))?, uint(2));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_keeps_queues_independent() -> TestResult {
    let dispatcher = dispatcher();
    let owner = signer(1);

    let outcomes = dispatcher.dispatch(&[
        batch(&owner, 1, 5, vec![invoke(INCREMENT, vec![])]).await,
        batch(&owner, 1, 9, vec![invoke(INCREMENT, vec![])]).await,
        batch(&owner, 2, 5, vec![invoke(INCREMENT, vec![])]).await,
    ])?;

    assert!(outcomes.iter().all(|outcome| outcome.is_success()));
    assert_eq!(dispatcher.last_nonce(&owner.identity(), &uint(5))?, uint(2));
    assert_eq!(dispatcher.last_nonce(&owner.identity(), &uint(9))?, uint(1));
    assert_eq!(dispatcher.next_nonce(&owner.identity(), &uint(0))?, uint(1));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_consumes_the_nonce_even_when_every_invocation_fails() -> TestResult {
    let dispatcher = dispatcher();
    let owner = signer(1);

    let outcome = dispatcher.dispatch(&[batch(&owner, 1, 0, vec![invoke(FAIL, vec![])]).await])?;
    assert!(!outcome[0].is_success());
    assert_eq!(dispatcher.last_nonce(&owner.identity(), &uint(0))?, uint(1));

    let retried = dispatcher.dispatch(&[batch(&owner, 1, 0, vec![invoke(INCREMENT, vec![])]).await])?;
    assert!(matches!(
        retried[0].error(),
        Some(AuthorityError::ReplayRejected { .. })
    ));
    assert_eq!(count(&dispatcher, &owner.identity()), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_tracks_nonces_per_invoker_not_per_root() -> TestResult {
    let dispatcher = dispatcher();
    let (root, delegate) = (signer(1), signer(2));
    let links = chain(&[&root, &delegate], &[]).await;

    let outcomes = dispatcher.dispatch(&[
        batch(&root, 1, 0, vec![invoke(INCREMENT, vec![])]).await,
        batch(&delegate, 1, 0, vec![invoke(INCREMENT, links)]).await,
    ])?;

    assert!(outcomes.iter().all(|outcome| outcome.is_success()));
    assert_eq!(count(&dispatcher, &root.identity()), 2);
    assert_eq!(dispatcher.last_nonce(&delegate.identity(), &uint(0))?, uint(1));
    Ok(())
}
