//! # Outbound Ports
//!
//! The node the light client talks to. Nothing returned through this port
//! is trusted until it passes verification.

use async_trait::async_trait;
use lc_crypto::PublicKey;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

use crate::domain::{
    AccountProofResponse, BlockProof, Hash, LightClientError, SubmitAck, TransactionStatus,
    ValidatorSet,
};

/// Full node connection - outbound port.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Consensus keys of the current validators.
    async fn validator_set(&self) -> Result<ValidatorSet, LightClientError>;

    /// Account record with block, table, account and history proofs.
    async fn account_with_proof(
        &self,
        public_key: PublicKey,
    ) -> Result<AccountProofResponse, LightClientError>;

    /// Block at `height` with its precommits.
    async fn block(&self, height: u64) -> Result<BlockProof, LightClientError>;

    /// Hand a serialized signed transaction to the node.
    async fn submit_transaction(&self, tx_bytes: &[u8]) -> Result<SubmitAck, LightClientError>;

    /// Current status of a transaction.
    async fn transaction_status(&self, tx_hash: Hash)
        -> Result<TransactionStatus, LightClientError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Scripted node for testing.
///
/// Status polls pop from a script; once it is exhausted every poll
/// returns `fallback_status`.
pub struct MockNode {
    /// Validator set returned by `validator_set`.
    pub validators: ValidatorSet,
    /// Response returned by `account_with_proof`.
    pub account: Option<AccountProofResponse>,
    /// Response returned by `block`, whatever the height.
    pub block: Option<BlockProof>,
    /// Acknowledgement returned by `submit_transaction`.
    pub ack: SubmitAck,
    /// Status once the script runs out.
    pub fallback_status: TransactionStatus,
    /// Should every call fail?
    pub should_fail: bool,
    script: Mutex<VecDeque<Result<TransactionStatus, LightClientError>>>,
    submitted: Mutex<Vec<Vec<u8>>>,
    status_calls: AtomicU32,
}

impl Default for MockNode {
    fn default() -> Self {
        Self {
            validators: ValidatorSet::default(),
            account: None,
            block: None,
            ack: SubmitAck::default(),
            fallback_status: TransactionStatus::Pending,
            should_fail: false,
            script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            status_calls: AtomicU32::new(0),
        }
    }
}

impl MockNode {
    /// Mock that answers status polls from `script` in order.
    pub fn with_statuses(
        script: impl IntoIterator<Item = Result<TransactionStatus, LightClientError>>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Mock whose every call fails with a network error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Mock acknowledging submissions with `ack`.
    pub fn with_ack(ack: SubmitAck) -> Self {
        Self {
            ack,
            ..Self::default()
        }
    }

    /// Raw transactions received so far.
    pub async fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().await.clone()
    }

    /// Number of status polls served.
    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), LightClientError> {
        if self.should_fail {
            return Err(LightClientError::NetworkError("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn validator_set(&self) -> Result<ValidatorSet, LightClientError> {
        self.check_failure()?;
        Ok(self.validators.clone())
    }

    async fn account_with_proof(
        &self,
        public_key: PublicKey,
    ) -> Result<AccountProofResponse, LightClientError> {
        self.check_failure()?;
        self.account
            .clone()
            .ok_or_else(|| LightClientError::NetworkError(format!("no account {public_key}")))
    }

    async fn block(&self, height: u64) -> Result<BlockProof, LightClientError> {
        self.check_failure()?;
        self.block
            .clone()
            .ok_or_else(|| LightClientError::NetworkError(format!("no block {height}")))
    }

    async fn submit_transaction(&self, tx_bytes: &[u8]) -> Result<SubmitAck, LightClientError> {
        self.check_failure()?;
        self.submitted.lock().await.push(tx_bytes.to_vec());
        Ok(self.ack.clone())
    }

    async fn transaction_status(
        &self,
        _tx_hash: Hash,
    ) -> Result<TransactionStatus, LightClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        match self.script.lock().await.pop_front() {
            Some(status) => status,
            None => Ok(self.fallback_status.clone()),
        }
    }
}
