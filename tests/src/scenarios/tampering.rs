//! # Lying Node
//!
//! Each fault makes the ledger serve a response that fails one link of the
//! proof chain. The service must refuse all of them.

#[cfg(test)]
mod tests {
    use crate::scenarios::service_with;
    use lc_crypto::KeyPair;
    use lc_light_client::{
        Faults, InMemoryLedger, LightClientApi, LightClientError, LightClientService,
    };

    /// Service with one committed account, then `faults` switched on.
    async fn tampered(faults: Faults) -> (LightClientService<InMemoryLedger>, KeyPair) {
        let client = service_with(|ledger| ledger).unwrap();
        let alice = KeyPair::from_seed([1; 32]);
        client.create_account(&alice, 100).await.unwrap();
        client.node().commit_now().await.unwrap();
        client.node().set_faults(faults).await;
        (client, alice)
    }

    #[tokio::test]
    async fn test_missing_quorum_is_untrusted() {
        let (client, alice) = tampered(Faults {
            keep_precommits: Some(2),
            ..Faults::default()
        })
        .await;
        let err = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LightClientError::UntrustedBlock {
                signed: 2,
                required: 3,
                total: 4
            }
        ));
        assert!(err.is_verification_failure());
    }

    #[tokio::test]
    async fn test_block_without_quorum_is_untrusted() {
        let (client, _) = tampered(Faults {
            keep_precommits: Some(2),
            ..Faults::default()
        })
        .await;
        assert!(matches!(
            client.get_verified_block(1).await,
            Err(LightClientError::UntrustedBlock { signed: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_table_proof() {
        let (client, alice) = tampered(Faults {
            corrupt_table_proof: true,
            ..Faults::default()
        })
        .await;
        let err = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap_err();
        assert!(matches!(err, LightClientError::ProofCorrupted(_)));
    }

    #[tokio::test]
    async fn test_dropped_history_transaction() {
        let (client, alice) = tampered(Faults {
            drop_history_transaction: true,
            ..Faults::default()
        })
        .await;
        let err = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LightClientError::HistoryLengthMismatch {
                transactions: 0,
                entries: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_honest_after_faults_cleared() {
        let (client, alice) = tampered(Faults {
            keep_precommits: Some(0),
            ..Faults::default()
        })
        .await;
        assert!(client.get_verified_account(alice.public_key()).await.is_err());

        client.node().set_faults(Faults::default()).await;
        let verified = client
            .get_verified_account(alice.public_key())
            .await
            .unwrap();
        assert_eq!(verified.account.balance, 100);
    }
}
