//! # Commitment Polling
//!
//! Bounded polling against a ledger that will not commit, and caller
//! cancellation.

#[cfg(test)]
mod tests {
    use crate::scenarios::service_with;
    use lc_crypto::KeyPair;
    use lc_light_client::{
        CommitResult, CreateAccount, Faults, LightClientApi, LightClientError, TransactionBody,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::assert_err;
    use tokio_util::sync::CancellationToken;

    fn stalled() -> Faults {
        Faults {
            stall_commits: true,
            ..Faults::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_ledger_times_out() {
        let client = service_with(|ledger| ledger.with_faults(stalled())).unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        let tx_hash = client.create_account(&alice, 100).await.unwrap();

        let started = tokio::time::Instant::now();
        let err = client
            .await_commitment(tx_hash, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LightClientError::CommitTimeout { attempts: 10 }));
        assert!(err.is_transient());
        // nine sleeps of 10ms between ten polls
        assert_eq!(started.elapsed(), Duration::from_millis(90));

        // a timeout is not a rejection: the transaction can still commit
        client.node().set_faults(Faults::default()).await;
        client.node().commit_now().await.unwrap();
        let result = client
            .await_commitment(tx_hash, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            result,
            CommitResult::Committed {
                tx_hash,
                attempts: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let client = Arc::new(service_with(|ledger| ledger.with_faults(stalled())).unwrap());
        let alice = KeyPair::from_seed([1; 32]);
        let tx_hash = client.create_account(&alice, 100).await.unwrap();
        let cancel = CancellationToken::new();

        let task = {
            let client = client.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { client.await_commitment(tx_hash, &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(25)).await;
        cancel.cancel();

        let err = assert_err!(task.await.unwrap());
        assert!(matches!(err, LightClientError::Cancelled));
        assert_eq!(client.node().height().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forged_signature_rejected() {
        let client = service_with(|ledger| ledger).unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        let mallory = KeyPair::from_seed([9; 32]);

        // mallory signs an account creation claiming alice's key
        let body = TransactionBody::CreateAccount(CreateAccount {
            owner: alice.public_key(),
            initial_balance: 1_000_000,
        });
        let tx_hash = client.submit(&mallory, &body).await.unwrap();
        let result = client
            .await_commitment(tx_hash, &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(result, CommitResult::Rejected { .. }));
        assert_eq!(client.node().balance(&alice.public_key()).await, None);
    }
}
