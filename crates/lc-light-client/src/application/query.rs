//! # Account Query Verification
//!
//! Walks an [`AccountProofResponse`] from the validator signatures down to
//! every transaction in the account history:
//!
//! ```text
//! validators ─► block.state_hash ─► table root ─► account ─► history_hash ─► transactions
//! ```
//!
//! Each link is checked against the one above it. The first failure aborts
//! the query and nothing from the response is returned.

use lc_crypto::PublicKey;
use tracing::{debug, warn};

use crate::algorithms::{codec, verify_block_proof};
use crate::config::LightClientConfig;
use crate::domain::{
    Account, AccountProofResponse, BlockProof, Hash, HistoryEntry, LightClientError,
    Transaction, ValidatorSet, VerifiedAccount, VerifiedBlock, VerifiedTransaction,
};

/// Verify a node response for `public_key` against the validator set.
pub fn verify_account(
    config: &LightClientConfig,
    validators: &ValidatorSet,
    public_key: &PublicKey,
    response: &AccountProofResponse,
) -> Result<VerifiedAccount, LightClientError> {
    verify_chain(config, validators, public_key, response).map_err(|e| {
        warn!("[lc] Verification of account {} failed: {}", public_key, e);
        e
    })
}

/// Verify a block served for `height` against the validator set.
pub fn verify_block(
    validators: &ValidatorSet,
    height: u64,
    proof: &BlockProof,
) -> Result<VerifiedBlock, LightClientError> {
    if proof.block.height != height {
        let err = LightClientError::ProofCorrupted(format!(
            "requested block {}, node served {}",
            height, proof.block.height
        ));
        warn!("[lc] Verification of block {} failed: {}", height, err);
        return Err(err);
    }
    let block_hash = verify_block_proof(proof, validators).map_err(|e| {
        warn!("[lc] Verification of block {} failed: {}", height, e);
        e
    })?;
    debug!(
        "[lc] Block {} trusted with {} precommits",
        height,
        proof.precommits.len()
    );
    Ok(VerifiedBlock {
        block: proof.block.clone(),
        block_hash,
        precommits: proof.precommits.len(),
    })
}

fn verify_chain(
    config: &LightClientConfig,
    validators: &ValidatorSet,
    public_key: &PublicKey,
    response: &AccountProofResponse,
) -> Result<VerifiedAccount, LightClientError> {
    let block = &response.block_proof.block;
    let block_hash = verify_block_proof(&response.block_proof, validators)?;
    debug!(
        "[lc] Block {} trusted with {} precommits",
        block.height,
        response.block_proof.precommits.len()
    );

    let table_root = verify_table(config, response, &block.state_hash)?;
    debug!("[lc] Account table root {}", hex::encode(table_root));

    let account = verify_account_record(public_key, response, &table_root)?;
    debug!(
        "[lc] Account {} proven with balance {} and {} history entries",
        public_key, account.balance, account.history_len
    );

    let entries = verify_history(&account, response)?;
    let transactions = verify_transactions(config, &entries, &response.transactions)?;
    debug!("[lc] {} history transactions verified", transactions.len());

    Ok(VerifiedAccount {
        block: block.clone(),
        block_hash,
        account,
        transactions,
    })
}

/// Prove the account table root under the block state hash.
fn verify_table(
    config: &LightClientConfig,
    response: &AccountProofResponse,
    state_hash: &Hash,
) -> Result<Hash, LightClientError> {
    let service_id = config.schema.service_id;
    let table_index = config.table_index;
    let key = codec::table_key(service_id, table_index);

    let checked = response.table_proof.check(state_hash)?;
    let value = checked
        .get(&key)?
        .ok_or(LightClientError::TableNotFound {
            service_id,
            table_index,
        })?;
    <Hash>::try_from(value).map_err(|_| {
        LightClientError::ProofCorrupted(format!("table root of {} bytes", value.len()))
    })
}

/// Prove the account record under the table root.
fn verify_account_record(
    public_key: &PublicKey,
    response: &AccountProofResponse,
    table_root: &Hash,
) -> Result<Account, LightClientError> {
    let checked = response.account_proof.check(table_root)?;
    let value = checked
        .get(public_key.as_bytes())?
        .ok_or(LightClientError::AccountNotFound(*public_key))?;
    let account = codec::decode_account(value)?;
    if &account.public_key != public_key {
        return Err(LightClientError::ProofCorrupted(format!(
            "record under {} belongs to {}",
            public_key, account.public_key
        )));
    }
    Ok(account)
}

/// Prove the full history list under the account's history hash.
fn verify_history(
    account: &Account,
    response: &AccountProofResponse,
) -> Result<Vec<HistoryEntry>, LightClientError> {
    let proof = &response.history_proof;
    if proof.length != account.history_len {
        return Err(LightClientError::HistoryCorrupted(format!(
            "history proof for {} entries, account has {}",
            proof.length, account.history_len
        )));
    }
    let elements = proof
        .verify(&account.history_hash, 0..account.history_len)
        .map_err(LightClientError::from_history_proof)?;
    elements
        .iter()
        .map(|(_, bytes)| codec::decode_history_entry(bytes))
        .collect()
}

/// Match raw transactions to proven history entries and check their signatures.
fn verify_transactions(
    config: &LightClientConfig,
    entries: &[HistoryEntry],
    raw: &[Vec<u8>],
) -> Result<Vec<VerifiedTransaction>, LightClientError> {
    if raw.len() != entries.len() {
        return Err(LightClientError::HistoryLengthMismatch {
            transactions: raw.len(),
            entries: entries.len(),
        });
    }

    entries
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (entry, bytes))| {
            let transaction = Transaction::from_bytes(bytes)?;
            let hash = transaction.hash()?;
            if hash != entry.tx_hash {
                return Err(LightClientError::TransactionHashMismatch { index });
            }
            let body = transaction.decode_body(&config.schema)?;
            let signed = transaction.signed_bytes()?;
            if !body.owner().verify(&signed, &transaction.signature) {
                return Err(LightClientError::InvalidSignature { index });
            }
            Ok(VerifiedTransaction {
                hash,
                execution_status: entry.execution_status,
                transaction,
                body,
            })
        })
        .collect()
}
