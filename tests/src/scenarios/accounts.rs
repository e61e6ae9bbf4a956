//! # Account Flows
//!
//! Create and transfer through the service, then read the result back
//! through the full proof chain.

#[cfg(test)]
mod tests {
    use crate::scenarios::{service, VALIDATOR_COUNT};
    use lc_crypto::KeyPair;
    use lc_light_client::{
        verify_account, AccountProofResponse, CommitResult, Issue, LightClientApi,
        LightClientError, NodeApi, TransactionBody,
    };
    use tokio_test::assert_ok;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_create_account_then_verified_read() {
        let client = service().unwrap();
        let alice = KeyPair::from_seed([1; 32]);

        let tx_hash = client.create_account(&alice, 100).await.unwrap();
        let result = client
            .await_commitment(tx_hash, &CancellationToken::new())
            .await
            .unwrap();
        // first poll sees Pending, second triggers the commit
        assert_eq!(
            result,
            CommitResult::Committed {
                tx_hash,
                attempts: 2
            }
        );

        let verified = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap();
        assert_eq!(verified.block.height, 1);
        assert_eq!(verified.account.balance, 100);
        assert_eq!(verified.account.history_len, 1);
        let tx = verified.find_transaction(&tx_hash).unwrap();
        assert!(tx.execution_status);
        assert_eq!(tx.body.owner(), alice.public_key());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_moves_balance() {
        let client = service().unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        let bob = KeyPair::from_seed([2; 32]);
        let cancel = CancellationToken::new();

        let a = client.create_account(&alice, 100).await.unwrap();
        let b = client.create_account(&bob, 0).await.unwrap();
        assert!(client.await_commitment(a, &cancel).await.unwrap().is_committed());
        assert!(client.await_commitment(b, &cancel).await.unwrap().is_committed());

        let result = client
            .transfer(&alice, bob.public_key(), 25, 7, &cancel)
            .await
            .unwrap();
        assert!(result.is_committed());

        let alice_view = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap();
        let bob_view = client.get_verified_account(bob.public_key()).await.unwrap();
        assert_eq!(alice_view.account.balance, 75);
        assert_eq!(bob_view.account.balance, 25);
        assert_eq!(alice_view.block_hash, bob_view.block_hash);

        // the transfer shows up in both histories
        for view in [&alice_view, &bob_view] {
            assert_eq!(view.transactions.len(), 2);
            assert!(view.find_transaction(result.tx_hash()).is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_funds_recorded_as_failed() {
        let client = service().unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        let bob = KeyPair::from_seed([2; 32]);
        let cancel = CancellationToken::new();

        let a = client.create_account(&alice, 10).await.unwrap();
        let b = client.create_account(&bob, 0).await.unwrap();
        client.await_commitment(a, &cancel).await.unwrap();
        client.await_commitment(b, &cancel).await.unwrap();

        let result = client
            .transfer(&alice, bob.public_key(), 500, 1, &cancel)
            .await
            .unwrap();
        // committed, but executed with a failure status
        assert!(result.is_committed());

        let alice_view = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap();
        assert_eq!(alice_view.account.balance, 10);
        let failed = alice_view.find_transaction(result.tx_hash()).unwrap();
        assert!(!failed.execution_status);

        let bob_view = client.get_verified_account(bob.public_key()).await.unwrap();
        assert_eq!(bob_view.transactions.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_appears_in_verified_history() {
        let client = service().unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        let cancel = CancellationToken::new();

        let created = client.create_account(&alice, 100).await.unwrap();
        client.await_commitment(created, &cancel).await.unwrap();

        let result = client.issue(&alice, 50, 11, &cancel).await.unwrap();
        assert!(result.is_committed());

        let view = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap();
        assert_eq!(view.account.balance, 150);
        let issued = view.find_transaction(result.tx_hash()).unwrap();
        assert!(issued.execution_status);
        assert_eq!(
            issued.body,
            TransactionBody::Issue(Issue {
                owner: alice.public_key(),
                amount: 50,
                seed: 11,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_verified_blocks_chain() {
        let client = service().unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        let created = client.create_account(&alice, 100).await.unwrap();
        client
            .await_commitment(created, &CancellationToken::new())
            .await
            .unwrap();

        let genesis = client.get_verified_block(0).await.unwrap();
        let first = client.get_verified_block(1).await.unwrap();
        assert_eq!(first.block.prev_hash, genesis.block_hash);
        assert_eq!(first.precommits, VALIDATOR_COUNT as usize);

        let account = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap();
        assert_eq!(account.block_hash, first.block_hash);
    }

    #[tokio::test]
    async fn test_unknown_account_not_found() {
        let client = service().unwrap();
        let stranger = client.generate_key_pair().public_key();
        let err = client.get_verified_account(stranger).await.unwrap_err();
        assert!(matches!(err, LightClientError::AccountNotFound(key) if key == stranger));
    }

    #[tokio::test]
    async fn test_response_verifies_after_json_round_trip() {
        let client = service().unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        client.create_account(&alice, 100).await.unwrap();
        client.node().commit_now().await.unwrap();

        let response = client
            .node()
            .account_with_proof(alice.public_key())
            .await
            .unwrap();
        let json = serde_json::to_string(&response).unwrap();
        let decoded: AccountProofResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, response);

        let validators = client.node().validator_set().await.unwrap();
        assert_eq!(validators.len(), VALIDATOR_COUNT as usize);
        let verified = assert_ok!(verify_account(
            client.config(),
            &validators,
            &alice.public_key(),
            &decoded
        ));
        assert_eq!(verified.account.balance, 100);
    }
}
