//! # Domain Errors
//!
//! Error types for the light client.
//!
//! Every verification failure aborts the whole query: the caller either
//! receives a fully verified snapshot or one of these errors, never a
//! partially trusted result.

use lc_crypto::{CryptoError, PublicKey};
use thiserror::Error;

pub use lc_crypto::Hash;

/// Failure of a Merkle proof check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// The proof is malformed or does not recompute to the expected root.
    #[error("Proof corrupted: {0}")]
    Corrupted(String),

    /// The requested index range is not within `[0, length]`.
    #[error("Range [{start}, {end}) outside list of length {length}")]
    Range {
        /// Range start (inclusive)
        start: u64,
        /// Range end (exclusive)
        end: u64,
        /// List length
        length: u64,
    },
}

impl ProofError {
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        ProofError::Corrupted(msg.into())
    }
}

/// Light client error types.
#[derive(Debug, Error)]
pub enum LightClientError {
    /// Malformed field or buffer (local bug or garbage from the node).
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Bad key or signature material.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A map proof did not recompute to its authenticated root.
    #[error("Proof corrupted: {0}")]
    ProofCorrupted(String),

    /// Requested list range outside the list.
    #[error("Range [{start}, {end}) outside list of length {length}")]
    Range {
        /// Range start (inclusive)
        start: u64,
        /// Range end (exclusive)
        end: u64,
        /// List length
        length: u64,
    },

    /// Block proof lacks a validator quorum.
    #[error("Untrusted block: {signed} valid signatures of {total} validators, need {required}")]
    UntrustedBlock {
        /// Valid distinct signatures counted before rejection
        signed: usize,
        /// Signatures required for quorum
        required: usize,
        /// Validator set size
        total: usize,
    },

    /// The service table is absent from the state tree.
    #[error("Table not found: service {service_id}, index {table_index}")]
    TableNotFound {
        /// Service id
        service_id: u16,
        /// Table index within the service
        table_index: u16,
    },

    /// The account is absent from the account table.
    #[error("Account not found: {0}")]
    AccountNotFound(PublicKey),

    /// The account history list proof is invalid.
    #[error("History corrupted: {0}")]
    HistoryCorrupted(String),

    /// Number of transactions differs from the number of proven history entries.
    #[error("History length mismatch: {transactions} transactions, {entries} proven entries")]
    HistoryLengthMismatch {
        /// Raw transactions returned by the node
        transactions: usize,
        /// Entries proven by the history list proof
        entries: usize,
    },

    /// A transaction does not hash to its proven history entry.
    #[error("Transaction hash mismatch at history index {index}")]
    TransactionHashMismatch {
        /// Position in the history
        index: usize,
    },

    /// A transaction signature does not verify under its declared owner.
    #[error("Invalid transaction signature at history index {index}")]
    InvalidSignature {
        /// Position in the history
        index: usize,
    },

    /// Transaction still pending after all poll attempts. It may commit later.
    #[error("Commit timeout after {attempts} attempts")]
    CommitTimeout {
        /// Attempts made
        attempts: u32,
    },

    /// Polling was cancelled by the caller.
    #[error("Commit polling cancelled")]
    Cancelled,

    /// Transport failure talking to the node.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LightClientError {
    /// Whether this error means the node served data that failed verification.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            LightClientError::ProofCorrupted(_)
                | LightClientError::UntrustedBlock { .. }
                | LightClientError::TableNotFound { .. }
                | LightClientError::AccountNotFound(_)
                | LightClientError::HistoryCorrupted(_)
                | LightClientError::HistoryLengthMismatch { .. }
                | LightClientError::TransactionHashMismatch { .. }
                | LightClientError::InvalidSignature { .. }
        )
    }

    /// Whether retrying the whole operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LightClientError::CommitTimeout { .. } | LightClientError::NetworkError(_)
        )
    }

    /// Map a list proof failure on the account history.
    pub(crate) fn from_history_proof(err: ProofError) -> Self {
        match err {
            ProofError::Corrupted(msg) => LightClientError::HistoryCorrupted(msg),
            ProofError::Range { start, end, length } => {
                LightClientError::Range { start, end, length }
            }
        }
    }
}

impl From<ProofError> for LightClientError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Corrupted(msg) => LightClientError::ProofCorrupted(msg),
            ProofError::Range { start, end, length } => {
                LightClientError::Range { start, end, length }
            }
        }
    }
}

impl From<prost::DecodeError> for LightClientError {
    fn from(err: prost::DecodeError) -> Self {
        LightClientError::Encoding(err.to_string())
    }
}

impl From<reqwest::Error> for LightClientError {
    fn from(err: reqwest::Error) -> Self {
        LightClientError::NetworkError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untrusted_block_error() {
        let err = LightClientError::UntrustedBlock {
            signed: 2,
            required: 3,
            total: 4,
        };
        assert!(err.to_string().contains("2 valid signatures of 4"));
        assert!(err.is_verification_failure());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_commit_timeout_is_transient() {
        let err = LightClientError::CommitTimeout { attempts: 10 };
        assert!(err.is_transient());
        assert!(!err.is_verification_failure());
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_proof_error_mapping() {
        let err: LightClientError = ProofError::corrupted("bad node").into();
        assert!(matches!(err, LightClientError::ProofCorrupted(ref m) if m == "bad node"));

        let err = LightClientError::from_history_proof(ProofError::corrupted("gap"));
        assert!(matches!(err, LightClientError::HistoryCorrupted(_)));

        let range = ProofError::Range {
            start: 0,
            end: 5,
            length: 3,
        };
        let err = LightClientError::from_history_proof(range);
        assert!(matches!(err, LightClientError::Range { length: 3, .. }));
    }

    #[test]
    fn test_crypto_error_conversion() {
        let err: LightClientError = CryptoError::InvalidPublicKey.into();
        assert!(matches!(err, LightClientError::Crypto(_)));
    }
}
