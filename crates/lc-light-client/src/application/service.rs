//! # Light Client Service
//!
//! Application service wiring the node port to query verification and
//! transaction submission.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use lc_crypto::{KeyPair, PublicKey};

use super::{query, submission};
use crate::config::LightClientConfig;
use crate::domain::{
    CommitResult, CreateAccount, Hash, Issue, LightClientError, TransactionBody, Transfer,
    VerifiedAccount, VerifiedBlock,
};
use crate::ports::{LightClientApi, NodeApi};

/// Light Client Service - verifies node answers and submits transactions.
pub struct LightClientService<N: NodeApi> {
    /// Configuration.
    config: LightClientConfig,
    /// Node connection.
    node: Arc<N>,
}

impl<N: NodeApi> LightClientService<N> {
    /// Create a new light client service.
    pub fn new(config: LightClientConfig, node: Arc<N>) -> Result<Self, LightClientError> {
        config.validate()?;
        Ok(Self { config, node })
    }

    /// Get configuration.
    pub fn config(&self) -> &LightClientConfig {
        &self.config
    }

    /// Get the node connection.
    pub fn node(&self) -> &Arc<N> {
        &self.node
    }

    /// Sign and submit any transaction body.
    pub async fn submit(
        &self,
        signer: &KeyPair,
        body: &TransactionBody,
    ) -> Result<Hash, LightClientError> {
        submission::submit(self.node.as_ref(), &self.config, signer, body).await
    }

    async fn submit_and_wait(
        &self,
        signer: &KeyPair,
        body: &TransactionBody,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError> {
        let tx_hash = self.submit(signer, body).await?;
        submission::await_commitment(self.node.as_ref(), &self.config, tx_hash, cancel).await
    }
}

#[async_trait]
impl<N: NodeApi + 'static> LightClientApi for LightClientService<N> {
    async fn create_account(
        &self,
        owner: &KeyPair,
        initial_balance: u64,
    ) -> Result<Hash, LightClientError> {
        let body = TransactionBody::CreateAccount(CreateAccount {
            owner: owner.public_key(),
            initial_balance,
        });
        self.submit(owner, &body).await
    }

    async fn transfer(
        &self,
        sender: &KeyPair,
        recipient: PublicKey,
        amount: u64,
        seed: u64,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError> {
        let body = TransactionBody::Transfer(Transfer {
            seed,
            from: sender.public_key(),
            to: recipient,
            amount,
        });
        self.submit_and_wait(sender, &body, cancel).await
    }

    async fn issue(
        &self,
        owner: &KeyPair,
        amount: u64,
        seed: u64,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError> {
        let body = TransactionBody::Issue(Issue {
            owner: owner.public_key(),
            amount,
            seed,
        });
        self.submit_and_wait(owner, &body, cancel).await
    }

    async fn get_verified_account(
        &self,
        public_key: PublicKey,
    ) -> Result<VerifiedAccount, LightClientError> {
        let validators = self.node.validator_set().await?;
        debug!("[lc] Fetched {} validator keys", validators.len());
        let response = self.node.account_with_proof(public_key).await?;
        query::verify_account(&self.config, &validators, &public_key, &response)
    }

    async fn get_verified_block(&self, height: u64) -> Result<VerifiedBlock, LightClientError> {
        let validators = self.node.validator_set().await?;
        let proof = self.node.block(height).await?;
        query::verify_block(&validators, height, &proof)
    }

    async fn await_commitment(
        &self,
        tx_hash: Hash,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError> {
        submission::await_commitment(self.node.as_ref(), &self.config, tx_hash, cancel).await
    }

    fn generate_key_pair(&self) -> KeyPair {
        lc_crypto::generate_key_pair()
    }

    fn generate_seed(&self) -> u64 {
        lc_crypto::generate_seed()
    }
}
