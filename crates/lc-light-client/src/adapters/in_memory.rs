//! In-Memory Ledger Adapter
//!
//! A simulated node implementing the `NodeApi` port. It executes account
//! transactions, commits the pool into blocks signed by its own validator
//! keys and serves real proofs over its state.
//!
//! State layout:
//!
//! ```text
//! state map:   table_key(service, table) -> account table root
//!              table_key(0, 0)           -> validator list root
//! account map: public key                -> encoded Account
//! history:     one list of encoded HistoryEntry per account
//! ```
//!
//! [`Faults`] tamper with served responses so tests can exercise every
//! verification failure.

use crate::algorithms::{
    block_hash, build_list_proof, build_map_proof, codec, encode_account, encode_block_header,
    encode_history_entry, list_root, map_root,
};
use crate::config::LightClientConfig;
use crate::domain::{
    Account, AccountProofResponse, BlockHeader, BlockProof, Hash, HistoryEntry, LightClientError,
    MapKey, Precommit, SubmitAck, Transaction, TransactionBody, TransactionStatus, ValidatorSet,
};
use crate::ports::outbound::NodeApi;
use async_trait::async_trait;
use lc_crypto::{KeyPair, PublicKey};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default number of status polls before the pool is committed.
pub const DEFAULT_COMMIT_AFTER_POLLS: u32 = 2;

/// Response tampering switches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Faults {
    /// Serve only this many precommits.
    pub keep_precommits: Option<usize>,
    /// Flip a bit in the table proof.
    pub corrupt_table_proof: bool,
    /// Omit the last raw transaction of the account history.
    pub drop_history_transaction: bool,
    /// Never commit the pool.
    pub stall_commits: bool,
}

struct LedgerState {
    accounts: BTreeMap<MapKey, Account>,
    histories: HashMap<PublicKey, Vec<HistoryEntry>>,
    committed: HashMap<Hash, Vec<u8>>,
    statuses: HashMap<Hash, TransactionStatus>,
    pool: Vec<(Hash, Transaction, TransactionBody)>,
    latest: BlockProof,
    blocks: Vec<BlockProof>,
    polls: u32,
    faults: Faults,
}

/// Simulated node.
pub struct InMemoryLedger {
    config: LightClientConfig,
    validators: Vec<KeyPair>,
    commit_after_polls: u32,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Create a ledger with `validator_count` deterministic validators and a
    /// signed genesis block.
    pub fn new(config: LightClientConfig, validator_count: u8) -> Result<Self, LightClientError> {
        let validators: Vec<KeyPair> = (0..validator_count)
            .map(|i| KeyPair::from_seed([0xA0 ^ i; 32]))
            .collect();
        let mut state = LedgerState {
            accounts: BTreeMap::new(),
            histories: HashMap::new(),
            committed: HashMap::new(),
            statuses: HashMap::new(),
            pool: Vec::new(),
            latest: BlockProof {
                block: BlockHeader {
                    height: 0,
                    prev_hash: [0; 32],
                    tx_hash: list_root(&[]),
                    state_hash: [0; 32],
                    tx_count: 0,
                },
                precommits: Vec::new(),
            },
            blocks: Vec::new(),
            polls: 0,
            faults: Faults::default(),
        };
        let ledger_state_hash = state_map(&config, &validators, &state.accounts)
            .map(|state| map_root(&state))?;
        state.latest.block.state_hash = ledger_state_hash;
        state.latest.precommits = sign_block(&validators, &state.latest.block);
        state.blocks.push(state.latest.clone());

        Ok(Self {
            config,
            validators,
            commit_after_polls: DEFAULT_COMMIT_AFTER_POLLS,
            state: Mutex::new(state),
        })
    }

    /// Commit the pool once this many status polls have been served.
    pub fn with_commit_after(mut self, polls: u32) -> Self {
        self.commit_after_polls = polls;
        self
    }

    /// Start with the given faults.
    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.state.get_mut().faults = faults;
        self
    }

    /// Replace the active faults.
    pub async fn set_faults(&self, faults: Faults) {
        self.state.lock().await.faults = faults;
    }

    /// Validator keys.
    pub fn validator_set_keys(&self) -> ValidatorSet {
        ValidatorSet::new(self.validators.iter().map(|k| k.public_key()).collect())
    }

    /// Height of the latest block.
    pub async fn height(&self) -> u64 {
        self.state.lock().await.latest.block.height
    }

    /// Balance of an account, read directly from the ledger.
    pub async fn balance(&self, public_key: &PublicKey) -> Option<u64> {
        self.state
            .lock()
            .await
            .accounts
            .get(public_key.as_bytes())
            .map(|a| a.balance)
    }

    /// Commit the pool immediately, regardless of faults.
    pub async fn commit_now(&self) -> Result<(), LightClientError> {
        let mut state = self.state.lock().await;
        self.commit(&mut state)
    }

    fn commit(&self, state: &mut LedgerState) -> Result<(), LightClientError> {
        let pool = std::mem::take(&mut state.pool);
        let mut tx_hashes = Vec::with_capacity(pool.len());

        for (tx_hash, transaction, body) in pool {
            let execution_status = execute(state, tx_hash, &body);
            debug!(
                "[lc] Ledger executed {} (success: {})",
                hex::encode(tx_hash),
                execution_status
            );
            state.committed.insert(tx_hash, transaction.to_bytes()?);
            state.statuses.insert(tx_hash, TransactionStatus::Committed);
            tx_hashes.push(tx_hash.to_vec());
        }

        let state_hash = map_root(&state_map(&self.config, &self.validators, &state.accounts)?);
        let block = BlockHeader {
            height: state.latest.block.height + 1,
            prev_hash: block_hash(&state.latest.block),
            tx_hash: list_root(&tx_hashes),
            state_hash,
            tx_count: tx_hashes.len() as u32,
        };
        info!(
            "[lc] Ledger committed block {} with {} transactions",
            block.height, block.tx_count
        );
        state.latest = BlockProof {
            precommits: sign_block(&self.validators, &block),
            block,
        };
        state.blocks.push(state.latest.clone());
        state.polls = 0;
        Ok(())
    }
}

fn sign_block(validators: &[KeyPair], block: &BlockHeader) -> Vec<Precommit> {
    let message = encode_block_header(block);
    validators
        .iter()
        .map(|k| Precommit {
            validator: k.public_key(),
            signature: k.sign(&message),
        })
        .collect()
}

fn account_map(
    accounts: &BTreeMap<MapKey, Account>,
) -> Result<BTreeMap<MapKey, Vec<u8>>, LightClientError> {
    accounts
        .iter()
        .map(|(key, account)| Ok((*key, encode_account(account)?)))
        .collect()
}

fn state_map(
    config: &LightClientConfig,
    validators: &[KeyPair],
    accounts: &BTreeMap<MapKey, Account>,
) -> Result<BTreeMap<MapKey, Vec<u8>>, LightClientError> {
    let validator_keys: Vec<Vec<u8>> = validators
        .iter()
        .map(|k| k.public_key().as_bytes().to_vec())
        .collect();
    let mut state = BTreeMap::new();
    state.insert(codec::table_key(0, 0), list_root(&validator_keys).to_vec());
    state.insert(
        codec::table_key(config.schema.service_id, config.table_index),
        map_root(&account_map(accounts)?).to_vec(),
    );
    Ok(state)
}

fn append_history(state: &mut LedgerState, owner: PublicKey, entry: HistoryEntry) {
    let history = state.histories.entry(owner).or_default();
    history.push(entry);
    let encoded: Vec<Vec<u8>> = history.iter().map(encode_history_entry).collect();
    if let Some(account) = state.accounts.get_mut(owner.as_bytes()) {
        account.history_len = encoded.len() as u64;
        account.history_hash = list_root(&encoded);
    }
}

/// Apply one transaction; returns its execution status.
fn execute(state: &mut LedgerState, tx_hash: Hash, body: &TransactionBody) -> bool {
    match body {
        TransactionBody::CreateAccount(tx) => {
            let key = *tx.owner.as_bytes();
            let created = !state.accounts.contains_key(&key);
            if created {
                state.accounts.insert(
                    key,
                    Account {
                        public_key: tx.owner,
                        name: String::new(),
                        balance: tx.initial_balance,
                        history_len: 0,
                        history_hash: list_root(&[]),
                    },
                );
            }
            append_history(
                state,
                tx.owner,
                HistoryEntry {
                    tx_hash,
                    execution_status: created,
                },
            );
            created
        }
        TransactionBody::Transfer(tx) => {
            let from = *tx.from.as_bytes();
            let to = *tx.to.as_bytes();
            let Some(balance) = state.accounts.get(&from).map(|a| a.balance) else {
                return false;
            };
            let recipient_fits = state
                .accounts
                .get(&to)
                .is_some_and(|a| from == to || a.balance.checked_add(tx.amount).is_some());
            let success = recipient_fits && balance >= tx.amount;
            if success && from != to {
                if let Some(sender) = state.accounts.get_mut(&from) {
                    sender.balance -= tx.amount;
                }
                if let Some(recipient) = state.accounts.get_mut(&to) {
                    recipient.balance += tx.amount;
                }
            }
            let entry = HistoryEntry {
                tx_hash,
                execution_status: success,
            };
            append_history(state, tx.from, entry);
            if success && from != to {
                append_history(state, tx.to, entry);
            }
            success
        }
        TransactionBody::Issue(tx) => {
            let Some(account) = state.accounts.get_mut(tx.owner.as_bytes()) else {
                return false;
            };
            let success = match account.balance.checked_add(tx.amount) {
                Some(balance) => {
                    account.balance = balance;
                    true
                }
                None => false,
            };
            append_history(
                state,
                tx.owner,
                HistoryEntry {
                    tx_hash,
                    execution_status: success,
                },
            );
            success
        }
    }
}

#[async_trait]
impl NodeApi for InMemoryLedger {
    async fn validator_set(&self) -> Result<ValidatorSet, LightClientError> {
        Ok(self.validator_set_keys())
    }

    async fn account_with_proof(
        &self,
        public_key: PublicKey,
    ) -> Result<AccountProofResponse, LightClientError> {
        let state = self.state.lock().await;
        let key = codec::table_key(self.config.schema.service_id, self.config.table_index);
        let state_entries = state_map(&self.config, &self.validators, &state.accounts)?;
        let accounts = account_map(&state.accounts)?;

        let entries: Vec<HistoryEntry> = if state.accounts.contains_key(public_key.as_bytes()) {
            state.histories.get(&public_key).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };
        let encoded: Vec<Vec<u8>> = entries.iter().map(encode_history_entry).collect();
        let mut transactions: Vec<Vec<u8>> = entries
            .iter()
            .filter_map(|e| state.committed.get(&e.tx_hash).cloned())
            .collect();

        let mut response = AccountProofResponse {
            block_proof: state.latest.clone(),
            table_proof: build_map_proof(&state_entries, &[key]),
            account_proof: build_map_proof(&accounts, &[*public_key.as_bytes()]),
            history_proof: build_list_proof(&encoded, 0..encoded.len() as u64)
                .map_err(LightClientError::from_history_proof)?,
            transactions: Vec::new(),
        };

        let faults = &state.faults;
        if let Some(keep) = faults.keep_precommits {
            response.block_proof.precommits.truncate(keep);
        }
        if faults.corrupt_table_proof {
            if let Some(node) = response.table_proof.proof.first_mut() {
                node.hash[0] ^= 1;
            }
        }
        if faults.drop_history_transaction {
            transactions.pop();
        }
        response.transactions = transactions;
        Ok(response)
    }

    async fn block(&self, height: u64) -> Result<BlockProof, LightClientError> {
        let state = self.state.lock().await;
        let mut proof = usize::try_from(height)
            .ok()
            .and_then(|h| state.blocks.get(h))
            .cloned()
            .ok_or_else(|| LightClientError::NetworkError(format!("no block at height {height}")))?;
        if let Some(keep) = state.faults.keep_precommits {
            proof.precommits.truncate(keep);
        }
        Ok(proof)
    }

    async fn submit_transaction(&self, tx_bytes: &[u8]) -> Result<SubmitAck, LightClientError> {
        let transaction = Transaction::from_bytes(tx_bytes)?;
        let tx_hash = lc_crypto::hash(tx_bytes);
        let mut state = self.state.lock().await;

        let checked = transaction
            .decode_body(&self.config.schema)
            .and_then(|body| {
                let signed = transaction.signed_bytes()?;
                if body.owner().verify(&signed, &transaction.signature) {
                    Ok(body)
                } else {
                    Err(LightClientError::InvalidSignature { index: 0 })
                }
            });

        match checked {
            Ok(body) => {
                debug!("[lc] Ledger pooled {}", hex::encode(tx_hash));
                state.statuses.insert(tx_hash, TransactionStatus::Pending);
                state.pool.push((tx_hash, transaction, body));
            }
            Err(e) => {
                state.statuses.insert(
                    tx_hash,
                    TransactionStatus::Rejected {
                        reason: e.to_string(),
                    },
                );
            }
        }
        Ok(SubmitAck {
            tx_hash: Some(tx_hash),
        })
    }

    async fn transaction_status(
        &self,
        tx_hash: Hash,
    ) -> Result<TransactionStatus, LightClientError> {
        let mut state = self.state.lock().await;
        if !state.pool.is_empty() && !state.faults.stall_commits {
            state.polls += 1;
            if state.polls >= self.commit_after_polls {
                self.commit(&mut state)?;
            }
        }
        Ok(state
            .statuses
            .get(&tx_hash)
            .cloned()
            .unwrap_or(TransactionStatus::Unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::verify_block_proof;
    use crate::application::{build_transaction, verify_account};
    use crate::domain::{CreateAccount, Issue, Transfer};

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new(LightClientConfig::for_testing(), 4).unwrap()
    }

    async fn submit(ledger: &InMemoryLedger, signer: &KeyPair, body: TransactionBody) -> Hash {
        let tx = build_transaction(&LightClientConfig::for_testing(), signer, &body).unwrap();
        ledger
            .submit_transaction(&tx.to_bytes().unwrap())
            .await
            .unwrap()
            .tx_hash
            .unwrap()
    }

    fn create(owner: &KeyPair, balance: u64) -> TransactionBody {
        TransactionBody::CreateAccount(CreateAccount {
            owner: owner.public_key(),
            initial_balance: balance,
        })
    }

    #[tokio::test]
    async fn test_genesis_is_signed() {
        let ledger = ledger();
        let state = ledger.state.lock().await;
        assert!(verify_block_proof(&state.latest, &ledger.validator_set_keys()).is_ok());
    }

    #[tokio::test]
    async fn test_commits_after_polls() {
        let ledger = ledger();
        let owner = KeyPair::from_seed([1; 32]);
        let hash = submit(&ledger, &owner, create(&owner, 100)).await;

        assert_eq!(
            ledger.transaction_status(hash).await.unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(
            ledger.transaction_status(hash).await.unwrap(),
            TransactionStatus::Committed
        );
        assert_eq!(ledger.height().await, 1);
        assert_eq!(ledger.balance(&owner.public_key()).await, Some(100));
    }

    #[tokio::test]
    async fn test_block_history() {
        let ledger = ledger();
        let owner = KeyPair::from_seed([1; 32]);
        submit(&ledger, &owner, create(&owner, 100)).await;
        ledger.commit_now().await.unwrap();

        let genesis = ledger.block(0).await.unwrap();
        let first = ledger.block(1).await.unwrap();
        assert_eq!(first.block.prev_hash, block_hash(&genesis.block));
        assert_eq!(first.block.tx_count, 1);
        assert!(verify_block_proof(&first, &ledger.validator_set_keys()).is_ok());
        assert!(matches!(
            ledger.block(2).await,
            Err(LightClientError::NetworkError(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_hash() {
        let ledger = ledger();
        assert_eq!(
            ledger.transaction_status([5; 32]).await.unwrap(),
            TransactionStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let ledger = ledger();
        let owner = KeyPair::from_seed([1; 32]);
        let impostor = KeyPair::from_seed([2; 32]);
        let hash = submit(&ledger, &impostor, create(&owner, 100)).await;
        assert!(matches!(
            ledger.transaction_status(hash).await.unwrap(),
            TransactionStatus::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_transfers_keep_balances() {
        let ledger = ledger();
        let a = KeyPair::from_seed([1; 32]);
        let b = KeyPair::from_seed([2; 32]);
        submit(&ledger, &a, create(&a, 10)).await;
        ledger.commit_now().await.unwrap();

        let too_much = TransactionBody::Transfer(Transfer {
            seed: 1,
            from: a.public_key(),
            to: b.public_key(),
            amount: 5,
        });
        // recipient does not exist yet
        submit(&ledger, &a, too_much).await;
        submit(&ledger, &a, create(&a, 999)).await;
        ledger.commit_now().await.unwrap();

        assert_eq!(ledger.balance(&a.public_key()).await, Some(10));
        let history = ledger.state.lock().await.histories[&a.public_key()].clone();
        let statuses: Vec<bool> = history.iter().map(|e| e.execution_status).collect();
        assert_eq!(statuses, vec![true, false, false]);
    }

    #[tokio::test]
    async fn test_issue_credits_owner() {
        let ledger = ledger();
        let owner = KeyPair::from_seed([1; 32]);
        let stranger = KeyPair::from_seed([2; 32]);
        let issue = |key: &KeyPair, amount, seed| {
            TransactionBody::Issue(Issue {
                owner: key.public_key(),
                amount,
                seed,
            })
        };
        let max = i64::MAX as u64;
        submit(&ledger, &owner, create(&owner, 10)).await;
        ledger.commit_now().await.unwrap();

        submit(&ledger, &owner, issue(&owner, max, 1)).await;
        // would overflow the balance
        submit(&ledger, &owner, issue(&owner, max, 2)).await;
        // no account, no history
        submit(&ledger, &stranger, issue(&stranger, 5, 3)).await;
        ledger.commit_now().await.unwrap();

        assert_eq!(ledger.balance(&owner.public_key()).await, Some(10 + max));
        assert_eq!(ledger.balance(&stranger.public_key()).await, None);
        let state = ledger.state.lock().await;
        let statuses: Vec<bool> = state.histories[&owner.public_key()]
            .iter()
            .map(|e| e.execution_status)
            .collect();
        assert_eq!(statuses, vec![true, true, false]);
        assert!(!state.histories.contains_key(&stranger.public_key()));
    }

    #[tokio::test]
    async fn test_served_proofs_verify() {
        let ledger = ledger();
        let config = LightClientConfig::for_testing();
        let owner = KeyPair::from_seed([1; 32]);
        submit(&ledger, &owner, create(&owner, 100)).await;
        ledger.commit_now().await.unwrap();

        let response = ledger.account_with_proof(owner.public_key()).await.unwrap();
        let verified = verify_account(
            &config,
            &ledger.validator_set_keys(),
            &owner.public_key(),
            &response,
        )
        .unwrap();
        assert_eq!(verified.account.balance, 100);
        assert_eq!(verified.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_stall_keeps_pending() {
        let ledger = ledger().with_faults(Faults {
            stall_commits: true,
            ..Faults::default()
        });
        let owner = KeyPair::from_seed([1; 32]);
        let hash = submit(&ledger, &owner, create(&owner, 100)).await;
        for _ in 0..5 {
            assert_eq!(
                ledger.transaction_status(hash).await.unwrap(),
                TransactionStatus::Pending
            );
        }
        assert_eq!(ledger.height().await, 0);
    }
}
