//! # Transaction Submission
//!
//! Builds signed transactions, hands them to the node and polls for
//! commitment.
//!
//! Polling is a bounded loop: at most `max_attempts` status requests with a
//! fixed `poll_interval` sleep before each retry. The sleep and the request
//! both race the caller's [`CancellationToken`].

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lc_crypto::KeyPair;

use crate::algorithms::codec;
use crate::config::LightClientConfig;
use crate::domain::{
    CommitResult, Hash, LightClientError, Transaction, TransactionBody, TransactionStatus,
};
use crate::ports::NodeApi;

/// Encode `body`, wrap it in a header for the configured network and sign it.
pub fn build_transaction(
    config: &LightClientConfig,
    signer: &KeyPair,
    body: &TransactionBody,
) -> Result<Transaction, LightClientError> {
    let mut transaction = Transaction {
        network_id: config.network_id,
        protocol_version: config.protocol_version,
        message_id: config.schema.message_id(body),
        service_id: config.schema.service_id,
        body: codec::encode_body(body)?,
        signature: lc_crypto::Signature::new([0; lc_crypto::SIGNATURE_LENGTH]),
    };
    transaction.signature = signer.sign(&transaction.signed_bytes()?);
    Ok(transaction)
}

/// Build, sign and submit a transaction; returns its hash.
///
/// The hash acknowledged by the node is returned when it echoes one, the
/// locally computed hash otherwise. An echo that differs from the local
/// hash is logged.
pub async fn submit<N: NodeApi + ?Sized>(
    node: &N,
    config: &LightClientConfig,
    signer: &KeyPair,
    body: &TransactionBody,
) -> Result<Hash, LightClientError> {
    let transaction = build_transaction(config, signer, body)?;
    let bytes = transaction.to_bytes()?;
    let local_hash = lc_crypto::hash(&bytes);

    let ack = node.submit_transaction(&bytes).await?;
    let tx_hash = match ack.tx_hash {
        Some(echoed) => {
            if echoed != local_hash {
                warn!(
                    "[lc] Node acknowledged {} for transaction hashed locally as {}",
                    hex::encode(echoed),
                    hex::encode(local_hash)
                );
            }
            echoed
        }
        None => local_hash,
    };

    info!(
        "[lc] Submitted transaction {} ({} bytes)",
        hex::encode(tx_hash),
        bytes.len()
    );
    Ok(tx_hash)
}

/// Poll the node until `tx_hash` is committed or rejected.
///
/// `Unknown` and `Pending` are retried. A network error counts as an
/// attempt; when the final attempt failed that way its error is returned
/// instead of `CommitTimeout`.
pub async fn await_commitment<N: NodeApi + ?Sized>(
    node: &N,
    config: &LightClientConfig,
    tx_hash: Hash,
    cancel: &CancellationToken,
) -> Result<CommitResult, LightClientError> {
    let mut last_error = None;

    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&tx_hash, attempt - 1)),
                _ = tokio::time::sleep(config.poll_interval) => {}
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(&tx_hash, attempt - 1)),
            status = node.transaction_status(tx_hash) => status,
        };

        match status {
            Ok(TransactionStatus::Committed) => {
                info!(
                    "[lc] Transaction {} committed after {} attempts",
                    hex::encode(tx_hash),
                    attempt
                );
                return Ok(CommitResult::Committed {
                    tx_hash,
                    attempts: attempt,
                });
            }
            Ok(TransactionStatus::Rejected { reason }) => {
                info!(
                    "[lc] Transaction {} rejected: {}",
                    hex::encode(tx_hash),
                    reason
                );
                return Ok(CommitResult::Rejected { tx_hash, reason });
            }
            Ok(status) => {
                debug!(
                    "[lc] Transaction {} is {:?} (attempt {}/{})",
                    hex::encode(tx_hash),
                    status,
                    attempt,
                    config.max_attempts
                );
                last_error = None;
            }
            Err(LightClientError::NetworkError(msg)) => {
                warn!(
                    "[lc] Status poll {}/{} for {} failed: {}",
                    attempt,
                    config.max_attempts,
                    hex::encode(tx_hash),
                    msg
                );
                last_error = Some(LightClientError::NetworkError(msg));
            }
            Err(e) => return Err(e),
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => {
            warn!(
                "[lc] Transaction {} still pending after {} attempts",
                hex::encode(tx_hash),
                config.max_attempts
            );
            Err(LightClientError::CommitTimeout {
                attempts: config.max_attempts,
            })
        }
    }
}

fn cancelled(tx_hash: &Hash, attempts: u32) -> LightClientError {
    info!(
        "[lc] Polling for {} cancelled after {} attempts",
        hex::encode(tx_hash),
        attempts
    );
    LightClientError::Cancelled
}
