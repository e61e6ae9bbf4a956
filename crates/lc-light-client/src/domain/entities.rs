//! # Domain Entities
//!
//! Core entities for the light client: signed transactions, blocks and the
//! account records they authenticate.

use super::errors::Hash;
use super::value_objects::{ListProof, MapProof};
use lc_crypto::{PublicKey, Signature};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Signed transaction message.
///
/// Wire layout (little-endian):
/// `[network_id:1][protocol_version:1][message_id:2][service_id:2][payload_length:4][body][signature:64]`
/// where `payload_length` is the total length including the signature.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Network identifier.
    pub network_id: u8,
    /// Protocol version.
    pub protocol_version: u8,
    /// Message type within the service.
    pub message_id: u16,
    /// Service the message is addressed to.
    pub service_id: u16,
    /// Encoded body.
    #[serde_as(as = "Hex")]
    pub body: Vec<u8>,
    /// Signature over every preceding byte.
    pub signature: Signature,
}

/// Account creation payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Key that owns the new account.
    pub owner: PublicKey,
    /// Starting balance.
    pub initial_balance: u64,
}

/// Transfer payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Anti-replay nonce.
    pub seed: u64,
    /// Sender (and signer).
    pub from: PublicKey,
    /// Recipient.
    pub to: PublicKey,
    /// Amount to move.
    pub amount: u64,
}

/// Issuance payload: the owner credits its own account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Account to credit (and signer).
    pub owner: PublicKey,
    /// Amount to add.
    pub amount: u64,
    /// Anti-replay nonce.
    pub seed: u64,
}

/// Transaction body, selected by `(service_id, message_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionBody {
    /// Create an account.
    CreateAccount(CreateAccount),
    /// Move funds between accounts.
    Transfer(Transfer),
    /// Add funds to an account.
    Issue(Issue),
}

impl TransactionBody {
    /// Key whose signature authorises this transaction.
    pub fn owner(&self) -> PublicKey {
        match self {
            TransactionBody::CreateAccount(tx) => tx.owner,
            TransactionBody::Transfer(tx) => tx.from,
            TransactionBody::Issue(tx) => tx.owner,
        }
    }
}

/// Block header. Validators sign its canonical encoding.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height.
    pub height: u64,
    /// Hash of the previous block.
    #[serde_as(as = "Hex")]
    pub prev_hash: Hash,
    /// Root of the block's transaction list.
    #[serde_as(as = "Hex")]
    pub tx_hash: Hash,
    /// Root of the state tree after executing the block.
    #[serde_as(as = "Hex")]
    pub state_hash: Hash,
    /// Number of transactions in the block.
    pub tx_count: u32,
}

/// One validator's signature over a block header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precommit {
    /// Consensus key of the signer.
    pub validator: PublicKey,
    /// Signature over the canonical header bytes.
    pub signature: Signature,
}

/// Block header with the validator signatures that finalize it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProof {
    /// The signed header.
    pub block: BlockHeader,
    /// Validator precommits.
    pub precommits: Vec<Precommit>,
}

/// Consensus keys of the current validators.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    /// Validator consensus keys, in configuration order.
    pub keys: Vec<PublicKey>,
}

impl ValidatorSet {
    /// Create a validator set.
    pub fn new(keys: Vec<PublicKey>) -> Self {
        Self { keys }
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `key` belongs to the set.
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.keys.contains(key)
    }

    /// Minimum number of signatures strictly above two thirds.
    pub fn quorum(&self) -> usize {
        self.keys.len() * 2 / 3 + 1
    }
}

/// Account record stored in the account table.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owner key (also the table key).
    pub public_key: PublicKey,
    /// Display name.
    pub name: String,
    /// Current balance.
    pub balance: u64,
    /// Number of entries in the account history.
    pub history_len: u64,
    /// Root hash of the history list.
    #[serde_as(as = "Hex")]
    pub history_hash: Hash,
}

/// One entry of an account history.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Hash of the transaction.
    #[serde_as(as = "Hex")]
    pub tx_hash: Hash,
    /// Whether execution succeeded.
    pub execution_status: bool,
}

/// Node response to an account query, with everything needed to verify it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProofResponse {
    /// Latest block and its precommits.
    pub block_proof: BlockProof,
    /// Proof from the state root to the service table root.
    pub table_proof: MapProof,
    /// Proof from the table root to the account record.
    pub account_proof: MapProof,
    /// Proof of the full account history.
    pub history_proof: ListProof,
    /// Raw signed transactions, one per history entry.
    #[serde_as(as = "Vec<Hex>")]
    pub transactions: Vec<Vec<u8>>,
}

/// Transaction that passed hash and signature checks.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedTransaction {
    /// Proven transaction hash.
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    /// Proven execution status.
    pub execution_status: bool,
    /// The signed message.
    pub transaction: Transaction,
    /// Decoded body.
    pub body: TransactionBody,
}

/// Fully verified account snapshot.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedAccount {
    /// Block the snapshot is anchored in.
    pub block: BlockHeader,
    /// Hash of that block.
    #[serde_as(as = "Hex")]
    pub block_hash: Hash,
    /// Account record.
    pub account: Account,
    /// Account history, oldest first.
    pub transactions: Vec<VerifiedTransaction>,
}

/// Block header backed by a validator quorum.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedBlock {
    /// The header.
    pub block: BlockHeader,
    /// Its hash.
    #[serde_as(as = "Hex")]
    pub block_hash: Hash,
    /// Distinct validators whose precommits verified.
    pub precommits: usize,
}

impl VerifiedAccount {
    /// Find a history transaction by hash.
    pub fn find_transaction(&self, hash: &Hash) -> Option<&VerifiedTransaction> {
        self.transactions.iter().find(|tx| &tx.hash == hash)
    }
}
