//! # Map Proof Verification
//!
//! Flat proofs over a Merkle-Patricia map with 32-byte keys.
//!
//! A proof lists the requested entries (present or absent) together with the
//! hashes of every subtree adjacent to them, sorted by path. Verification
//! merges both into one contour and folds it bottom-up into the root.
//!
//! ## Hashing
//!
//! - value: `H(value)`
//! - single-entry map: `H(leaf_path ‖ H(value))`
//! - branch: `H(left.hash ‖ right.hash ‖ left.path ‖ right.path)`
//! - empty map: 32 zero bytes

use crate::domain::{Hash, MapEntry, MapKey, MapProof, MapProofEntry, ProofError, ProofPath};
use lc_crypto::Sha256Hasher;
use std::collections::{BTreeMap, BTreeSet};

/// Root hash of an empty map.
pub const EMPTY_MAP_ROOT: Hash = [0u8; 32];

fn single_entry_root(path: &ProofPath, value_hash: &Hash) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update(&path.to_raw());
    hasher.update(value_hash);
    hasher.finalize()
}

fn branch_hash(left: &MapProofEntry, right: &MapProofEntry) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update(&left.hash);
    hasher.update(&right.hash);
    hasher.update(&left.path.to_raw());
    hasher.update(&right.path.to_raw());
    hasher.finalize()
}

/// A map proof whose root has been checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckedMapProof {
    root: Hash,
    entries: BTreeMap<MapKey, Vec<u8>>,
    missing: BTreeSet<MapKey>,
}

impl CheckedMapProof {
    /// Authenticated root hash.
    pub fn root_hash(&self) -> &Hash {
        &self.root
    }

    /// Look up a key covered by the proof.
    ///
    /// `Ok(Some(value))` for a key proven present, `Ok(None)` for a key
    /// proven absent. A key the proof says nothing about is an error: its
    /// presence cannot be decided.
    pub fn get(&self, key: &MapKey) -> Result<Option<&[u8]>, ProofError> {
        if let Some(value) = self.entries.get(key) {
            return Ok(Some(value.as_slice()));
        }
        if self.missing.contains(key) {
            return Ok(None);
        }
        Err(ProofError::corrupted(format!(
            "proof does not cover key {}",
            hex::encode(key)
        )))
    }

    /// Proven entries.
    pub fn entries(&self) -> impl Iterator<Item = (&MapKey, &[u8])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Keys proven absent.
    pub fn missing_keys(&self) -> impl Iterator<Item = &MapKey> {
        self.missing.iter()
    }
}

impl MapProof {
    /// Recompute the root and compare it with `expected_root`.
    pub fn check(&self, expected_root: &Hash) -> Result<CheckedMapProof, ProofError> {
        self.check_order()?;

        let mut entries = BTreeMap::new();
        for entry in &self.entries {
            if entries.insert(entry.key, entry.value.clone()).is_some() {
                return Err(ProofError::corrupted(format!(
                    "duplicate entry for key {}",
                    hex::encode(entry.key)
                )));
            }
        }
        let mut missing = BTreeSet::new();
        for key in &self.missing_keys {
            if entries.contains_key(key) || !missing.insert(*key) {
                return Err(ProofError::corrupted(format!(
                    "key {} listed twice",
                    hex::encode(key)
                )));
            }
        }

        self.check_no_embedded_keys()?;

        let root = match (self.proof.as_slice(), self.entries.as_slice()) {
            ([], []) => EMPTY_MAP_ROOT,
            ([node], []) => {
                if !node.path.is_leaf() {
                    return Err(ProofError::corrupted(
                        "single proof node must be a leaf",
                    ));
                }
                single_entry_root(&node.path, &node.hash)
            }
            ([], [entry]) => {
                single_entry_root(&ProofPath::leaf(entry.key), &lc_crypto::hash(&entry.value))
            }
            _ => self.fold_contour(),
        };

        if &root != expected_root {
            return Err(ProofError::corrupted(format!(
                "map root {} does not match expected {}",
                hex::encode(root),
                hex::encode(expected_root)
            )));
        }

        Ok(CheckedMapProof {
            root,
            entries,
            missing,
        })
    }

    /// Proof paths must be strictly ascending with none embedded in its successor.
    fn check_order(&self) -> Result<(), ProofError> {
        for pair in self.proof.windows(2) {
            let (prev, next) = (&pair[0].path, &pair[1].path);
            if prev == next {
                return Err(ProofError::corrupted(format!("duplicate path {prev:?}")));
            }
            if prev > next {
                return Err(ProofError::corrupted(format!(
                    "invalid order: {prev:?} before {next:?}"
                )));
            }
            if prev.is_prefix_of(next) {
                return Err(ProofError::corrupted(format!(
                    "embedded path: {prev:?} is a prefix of {next:?}"
                )));
            }
        }
        Ok(())
    }

    /// No proof node may hide a requested key.
    fn check_no_embedded_keys(&self) -> Result<(), ProofError> {
        let requested = self
            .entries
            .iter()
            .map(|e| e.key)
            .chain(self.missing_keys.iter().copied());
        for key in requested {
            let leaf = ProofPath::leaf(key);
            if let Some(node) = self.proof.iter().find(|n| n.path.is_prefix_of(&leaf)) {
                return Err(ProofError::corrupted(format!(
                    "embedded path: {:?} covers requested key {}",
                    node.path,
                    hex::encode(key)
                )));
            }
        }
        Ok(())
    }

    /// Fold the sorted contour of proof nodes and entry leaves into the root.
    /// Requires at least two contour nodes.
    fn fold_contour(&self) -> Hash {
        let mut nodes: Vec<MapProofEntry> = self
            .entries
            .iter()
            .map(|e| MapProofEntry {
                path: ProofPath::leaf(e.key),
                hash: lc_crypto::hash(&e.value),
            })
            .chain(self.proof.iter().copied())
            .collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));

        let mut contour: Vec<MapProofEntry> = Vec::with_capacity(nodes.len());
        let mut last_prefix = nodes[0].path.common_prefix(&nodes[1].path);
        contour.push(nodes[0]);
        contour.push(nodes[1]);

        for node in &nodes[2..] {
            let top = contour[contour.len() - 1].path;
            let new_prefix = top.common_prefix(&node.path);
            while contour.len() > 1 && new_prefix.bits() < last_prefix.bits() {
                last_prefix = fold(&mut contour, last_prefix).unwrap_or(last_prefix);
            }
            contour.push(*node);
            last_prefix = new_prefix;
        }
        while contour.len() > 1 {
            last_prefix = fold(&mut contour, last_prefix).unwrap_or(last_prefix);
        }
        contour[0].hash
    }
}

/// Replace the two topmost contour nodes with their parent at `prefix`.
/// Returns the common prefix of the parent and the node below it.
fn fold(contour: &mut Vec<MapProofEntry>, prefix: ProofPath) -> Option<ProofPath> {
    let right = contour.pop()?;
    let left = contour.pop()?;
    let parent = MapProofEntry {
        path: prefix,
        hash: branch_hash(&left, &right),
    };
    let below = contour.last().map(|prev| prev.path.common_prefix(&prefix));
    contour.push(parent);
    below
}

// -----------------------------------------------------------------------------
// Builders (full map in hand)
// -----------------------------------------------------------------------------

/// Path and hash of the subtree over `leaves` (sorted, non-empty).
fn subtree(leaves: &[(ProofPath, Hash)]) -> MapProofEntry {
    if let [(path, hash)] = leaves {
        return MapProofEntry {
            path: *path,
            hash: *hash,
        };
    }
    let (left, right) = split(leaves);
    let prefix = leaves[0].0.common_prefix(&leaves[leaves.len() - 1].0);
    MapProofEntry {
        path: prefix,
        hash: branch_hash(&subtree(left), &subtree(right)),
    }
}

/// Split sorted leaves (at least two) at the first bit past their common prefix.
fn split(leaves: &[(ProofPath, Hash)]) -> (&[(ProofPath, Hash)], &[(ProofPath, Hash)]) {
    let prefix = leaves[0].0.common_prefix(&leaves[leaves.len() - 1].0);
    let at = leaves
        .iter()
        .position(|(path, _)| path.bit(prefix.bits()))
        .unwrap_or(leaves.len());
    leaves.split_at(at)
}

fn sorted_leaves(map: &BTreeMap<MapKey, Vec<u8>>) -> Vec<(ProofPath, Hash)> {
    let mut leaves: Vec<_> = map
        .iter()
        .map(|(key, value)| (ProofPath::leaf(*key), lc_crypto::hash(value)))
        .collect();
    leaves.sort_by(|a, b| a.0.cmp(&b.0));
    leaves
}

/// Root hash of a complete map.
pub fn map_root(map: &BTreeMap<MapKey, Vec<u8>>) -> Hash {
    let leaves = sorted_leaves(map);
    match leaves.as_slice() {
        [] => EMPTY_MAP_ROOT,
        [(path, hash)] => single_entry_root(path, hash),
        _ => subtree(&leaves).hash,
    }
}

/// Build a proof for `keys` against a complete map.
pub fn build_map_proof(map: &BTreeMap<MapKey, Vec<u8>>, keys: &[MapKey]) -> MapProof {
    let requested: BTreeSet<MapKey> = keys.iter().copied().collect();
    let requested_paths: Vec<ProofPath> = requested.iter().map(|k| ProofPath::leaf(*k)).collect();
    let leaves = sorted_leaves(map);

    let mut proof = MapProof::default();
    if !leaves.is_empty() {
        collect(&leaves, &requested_paths, map, &mut proof);
    }
    proof.missing_keys = requested
        .into_iter()
        .filter(|key| !map.contains_key(key))
        .collect();
    proof.proof.sort_by(|a, b| a.path.cmp(&b.path));
    proof
}

fn collect(
    leaves: &[(ProofPath, Hash)],
    requested: &[ProofPath],
    map: &BTreeMap<MapKey, Vec<u8>>,
    out: &mut MapProof,
) {
    let node = subtree(leaves);
    if !requested.iter().any(|key| node.path.is_prefix_of(key)) {
        out.proof.push(node);
        return;
    }
    if let [(path, _)] = leaves {
        // a leaf covering a requested key is that key
        if let Some(value) = map.get(path.key()) {
            out.entries.push(MapEntry {
                key: *path.key(),
                value: value.clone(),
            });
        }
        return;
    }
    let (left, right) = split(leaves);
    collect(left, requested, map, out);
    collect(right, requested, map, out);
}
