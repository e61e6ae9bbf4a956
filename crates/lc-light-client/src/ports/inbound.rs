//! # Inbound Ports
//!
//! API trait defining what the light client offers its callers.

use async_trait::async_trait;
use lc_crypto::{KeyPair, PublicKey};
use tokio_util::sync::CancellationToken;

use crate::domain::{CommitResult, Hash, LightClientError, VerifiedAccount, VerifiedBlock};

/// Light Client API - inbound port.
#[async_trait]
pub trait LightClientApi: Send + Sync {
    /// Submit an account creation signed by `owner`; returns the transaction hash.
    async fn create_account(
        &self,
        owner: &KeyPair,
        initial_balance: u64,
    ) -> Result<Hash, LightClientError>;

    /// Submit a transfer and wait until it is committed or rejected.
    async fn transfer(
        &self,
        sender: &KeyPair,
        recipient: PublicKey,
        amount: u64,
        seed: u64,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError>;

    /// Submit an issuance to `owner`'s own account and wait for the outcome.
    async fn issue(
        &self,
        owner: &KeyPair,
        amount: u64,
        seed: u64,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError>;

    /// Fetch an account and verify it down to the validator signatures.
    async fn get_verified_account(
        &self,
        public_key: PublicKey,
    ) -> Result<VerifiedAccount, LightClientError>;

    /// Fetch the block at `height` and check its validator quorum.
    async fn get_verified_block(&self, height: u64) -> Result<VerifiedBlock, LightClientError>;

    /// Poll until the transaction is committed, rejected, timed out or cancelled.
    async fn await_commitment(
        &self,
        tx_hash: Hash,
        cancel: &CancellationToken,
    ) -> Result<CommitResult, LightClientError>;

    /// Fresh random key pair.
    fn generate_key_pair(&self) -> KeyPair;

    /// Fresh anti-replay seed.
    fn generate_seed(&self) -> u64;
}
