//! # Domain Value Objects
//!
//! Immutable value types: proof structures as served by the node, and the
//! states a submitted transaction moves through.

use super::errors::{Hash, ProofError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{hex::Hex, serde_as};
use std::cmp::Ordering;
use std::fmt;

/// Key of a proof map (32 bytes).
pub type MapKey = [u8; 32];

/// Kind of a node in the map trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Inner node, identified by a key prefix.
    Branch,
    /// Leaf, identified by a full key.
    Leaf,
}

impl NodeKind {
    fn code(self) -> u8 {
        match self {
            NodeKind::Branch => 0,
            NodeKind::Leaf => 1,
        }
    }
}

/// Position of a node in the map trie: a key prefix of `bits` bits.
///
/// Bit `i` is bit `i % 8` (least significant first) of byte `i / 8`.
/// Leaves always have 256 significant bits; branches have fewer and all
/// bits past the prefix are zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProofPath {
    kind: NodeKind,
    key: MapKey,
    bits: u16,
}

impl ProofPath {
    /// Key size in bits.
    pub const KEY_BITS: u16 = 256;
    /// Size of the canonical encoding.
    pub const RAW_SIZE: usize = 34;

    /// Path of the leaf holding `key`.
    pub fn leaf(key: MapKey) -> Self {
        Self {
            kind: NodeKind::Leaf,
            key,
            bits: Self::KEY_BITS,
        }
    }

    /// Branch path for the first `bits` bits of `key`.
    pub fn branch(key: MapKey, bits: u16) -> Result<Self, ProofError> {
        if bits >= Self::KEY_BITS {
            return Err(ProofError::corrupted(format!(
                "branch path with {bits} significant bits"
            )));
        }
        if truncate(&key, bits) != key {
            return Err(ProofError::corrupted("branch path has bits set past its prefix"));
        }
        Ok(Self {
            kind: NodeKind::Branch,
            key,
            bits,
        })
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether this is a leaf path.
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u16 {
        self.bits
    }

    /// Key bytes (zero past the prefix).
    pub fn key(&self) -> &MapKey {
        &self.key
    }

    /// Value of bit `index`.
    pub fn bit(&self, index: u16) -> bool {
        key_bit(&self.key, index)
    }

    /// Longest common prefix of two paths.
    pub fn common_prefix(&self, other: &ProofPath) -> ProofPath {
        if self == other {
            return *self;
        }
        let limit = self.bits.min(other.bits);
        let len = first_difference(&self.key, &other.key, limit).unwrap_or(limit);
        ProofPath {
            kind: NodeKind::Branch,
            key: truncate(&self.key, len),
            bits: len,
        }
    }

    /// Whether this path is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &ProofPath) -> bool {
        self.bits <= other.bits && first_difference(&self.key, &other.key, self.bits).is_none()
    }

    /// Canonical encoding: `[kind][key:32][bits]`, bits written as 0 for leaves.
    pub fn to_raw(&self) -> [u8; Self::RAW_SIZE] {
        let mut raw = [0u8; Self::RAW_SIZE];
        raw[0] = self.kind.code();
        raw[1..33].copy_from_slice(&self.key);
        raw[33] = match self.kind {
            NodeKind::Leaf => 0,
            NodeKind::Branch => self.bits as u8,
        };
        raw
    }

    /// Parse the canonical encoding.
    pub fn from_raw(raw: &[u8]) -> Result<Self, ProofError> {
        if raw.len() != Self::RAW_SIZE {
            return Err(ProofError::corrupted(format!(
                "proof path of {} bytes",
                raw.len()
            )));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[1..33]);
        match raw[0] {
            0 => Self::branch(key, u16::from(raw[33])),
            1 if raw[33] == 0 => Ok(Self::leaf(key)),
            1 => Err(ProofError::corrupted("leaf path with non-zero bit count")),
            code => Err(ProofError::corrupted(format!("unknown node kind {code}"))),
        }
    }
}

impl Ord for ProofPath {
    /// The first differing bit decides (set bit is greater); otherwise the
    /// shorter path (a prefix) sorts first.
    fn cmp(&self, other: &Self) -> Ordering {
        let limit = self.bits.min(other.bits);
        match first_difference(&self.key, &other.key, limit) {
            Some(i) if self.bit(i) => Ordering::Greater,
            Some(_) => Ordering::Less,
            None => self.bits.cmp(&other.bits),
        }
    }
}

impl PartialOrd for ProofPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ProofPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: String = (0..self.bits.min(16))
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect();
        let ellipsis = if self.bits > 16 { ".." } else { "" };
        write!(f, "ProofPath({:?}, {}{}/{})", self.kind, bits, ellipsis, self.bits)
    }
}

impl Serialize for ProofPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.to_raw()))
    }
}

impl<'de> Deserialize<'de> for ProofPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
        ProofPath::from_raw(&raw).map_err(serde::de::Error::custom)
    }
}

fn key_bit(key: &MapKey, index: u16) -> bool {
    let index = usize::from(index);
    (key[index / 8] >> (index % 8)) & 1 == 1
}

/// Index of the first bit below `limit` where the keys differ.
fn first_difference(a: &MapKey, b: &MapKey, limit: u16) -> Option<u16> {
    for (byte, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = x ^ y;
        if diff != 0 {
            let index = (byte * 8) as u16 + diff.trailing_zeros() as u16;
            return (index < limit).then_some(index);
        }
        if (byte as u16 + 1) * 8 >= limit {
            return None;
        }
    }
    None
}

/// Clear every bit at position `>= bits`.
fn truncate(key: &MapKey, bits: u16) -> MapKey {
    let mut out = [0u8; 32];
    let full = usize::from(bits / 8);
    out[..full].copy_from_slice(&key[..full]);
    let rem = bits % 8;
    if rem != 0 {
        out[full] = key[full] & ((1u8 << rem) - 1);
    }
    out
}

/// Hash of a subtree the proof does not expand.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapProofEntry {
    /// Position of the subtree root.
    pub path: ProofPath,
    /// Hash of the subtree.
    #[serde_as(as = "Hex")]
    pub hash: Hash,
}

/// Key-value pair proven present.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    /// Map key.
    #[serde_as(as = "Hex")]
    pub key: MapKey,
    /// Stored value.
    #[serde_as(as = "Hex")]
    pub value: Vec<u8>,
}

/// Flat proof for a set of keys of a Merkle-Patricia map.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapProof {
    /// Hashes of subtrees adjacent to the requested keys.
    pub proof: Vec<MapProofEntry>,
    /// Requested keys that are present, with their values.
    pub entries: Vec<MapEntry>,
    /// Requested keys that are absent.
    #[serde_as(as = "Vec<Hex>")]
    pub missing_keys: Vec<MapKey>,
}

/// Hashed node of a list proof.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProofNode {
    /// Height in the tree (0 = leaves).
    pub height: u8,
    /// Index within its level.
    pub index: u64,
    /// Node hash.
    #[serde_as(as = "Hex")]
    pub hash: Hash,
}

/// List element included in a proof.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListElement {
    /// Position in the list.
    pub index: u64,
    /// Serialized element.
    #[serde_as(as = "Hex")]
    pub value: Vec<u8>,
}

/// Flat proof for a range of a Merkle list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProof {
    /// Number of elements in the list.
    pub length: u64,
    /// Hashes of subtrees adjacent to the proven range.
    pub proof: Vec<ListProofNode>,
    /// Proven elements.
    pub elements: Vec<ListElement>,
}

/// Status of a submitted transaction as reported by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Node has not seen the transaction.
    Unknown,
    /// In the pool, not yet in a block.
    Pending,
    /// Included and executed in a finalized block.
    Committed,
    /// Refused by the node.
    Rejected {
        /// Reason given by the node; empty when none was sent.
        #[serde(default)]
        reason: String,
    },
}

/// Final outcome of commitment polling.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CommitResult {
    /// The transaction is in a block.
    Committed {
        /// Transaction hash.
        #[serde_as(as = "Hex")]
        tx_hash: Hash,
        /// Polls needed.
        attempts: u32,
    },
    /// The node refused the transaction.
    Rejected {
        /// Transaction hash.
        #[serde_as(as = "Hex")]
        tx_hash: Hash,
        /// Reason given by the node.
        reason: String,
    },
}

impl CommitResult {
    /// Whether the transaction committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitResult::Committed { .. })
    }

    /// Transaction hash.
    pub fn tx_hash(&self) -> &Hash {
        match self {
            CommitResult::Committed { tx_hash, .. } | CommitResult::Rejected { tx_hash, .. } => {
                tx_hash
            }
        }
    }
}

/// Acknowledgement of a submitted transaction.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Hash echoed by the node, if any.
    #[serde_as(as = "Option<Hex>")]
    #[serde(default)]
    pub tx_hash: Option<Hash>,
}
