//! # LC Light Client
//!
//! Trust-minimized client for a BFT account ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Let an application talk to a single untrusted node and still:
//! - submit signed account transactions and wait for their commitment
//! - read account state that is proven, not merely reported
//!
//! ## Trust Chain
//!
//! | Step | Checked against |
//! |------|-----------------|
//! | Block header | > 2/3 validator precommits (also served alone by `get_verified_block`) |
//! | Account table root | Map proof to `block.state_hash` |
//! | Account record | Map proof to the table root |
//! | History entries | List proof to `account.history_hash` |
//! | Transactions | Entry hash and owner signature |
//!
//! ## Module Structure
//!
//! ```text
//! lc-light-client/
//! ├── domain/          # Transactions, blocks, accounts, proofs, errors
//! ├── algorithms/      # Codec, map/list proof verification, block quorum
//! ├── ports/           # LightClientApi (inbound) + NodeApi (outbound)
//! ├── application/     # Query verification, submission, LightClientService
//! ├── adapters/        # HttpNode, InMemoryLedger
//! └── config.rs        # LightClientConfig, TransactionSchema
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{Faults, HttpNode, InMemoryLedger};
pub use algorithms::{
    build_list_proof, build_map_proof, list_root, map_root, verify_block_proof, CheckedMapProof,
};
pub use application::{verify_account, verify_block, LightClientService};
pub use config::{LightClientConfig, MessageKind, TransactionSchema};
pub use domain::{
    Account, AccountProofResponse, BlockHeader, BlockProof, CommitResult, CreateAccount, Hash,
    HistoryEntry, Issue, LightClientError, ListProof, MapProof, Precommit, ProofError,
    SubmitAck, Transaction, TransactionBody, TransactionStatus, Transfer, ValidatorSet,
    VerifiedAccount, VerifiedBlock, VerifiedTransaction,
};
pub use ports::{LightClientApi, MockNode, NodeApi};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
