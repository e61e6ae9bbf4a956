//! # List Proof Verification
//!
//! Flat proofs over a Merkle list: a balanced binary tree with every element
//! at height 0. The last node of an odd-sized level has no right sibling and
//! is hashed alone.
//!
//! ```text
//!  H
//!  2        o
//!         /   \
//!  1    o       h        e: proven element
//!      / \               h: proof node
//!  0  h   e              o: recomputed
//! ```
//!
//! ## Hashing
//!
//! - leaf: `H(0x00 ‖ element)`
//! - branch: `H(0x01 ‖ left ‖ right?)`
//! - list: `H(0x02 ‖ length u64 LE ‖ tree_root)`, tree root of an empty list is zeros

use crate::domain::{Hash, ListElement, ListProof, ListProofNode, ProofError};
use lc_crypto::Sha256Hasher;
use std::collections::BTreeMap;
use std::ops::Range;

/// Largest supported list size.
pub const MAX_LIST_SIZE: u64 = 1 << 56;

const LEAF_PREFIX: u8 = 0x00;
const BRANCH_PREFIX: u8 = 0x01;
const LIST_PREFIX: u8 = 0x02;

/// Height of the tree over `size` elements: `ceil(log2(size))`.
pub fn tree_height(size: u64) -> u8 {
    if size <= 1 {
        0
    } else {
        (64 - (size - 1).leading_zeros()) as u8
    }
}

fn level_size(size: u64, height: u8) -> u64 {
    if size == 0 {
        0
    } else {
        ((size - 1) >> height) + 1
    }
}

/// Hash of a list element.
pub fn leaf_hash(element: &[u8]) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update_byte(LEAF_PREFIX);
    hasher.update(element);
    hasher.finalize()
}

fn branch_hash(left: &Hash, right: Option<&Hash>) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update_byte(BRANCH_PREFIX);
    hasher.update(left);
    if let Some(right) = right {
        hasher.update(right);
    }
    hasher.finalize()
}

/// Hash binding the list length to its tree root.
pub fn list_hash(length: u64, tree_root: &Hash) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update_byte(LIST_PREFIX);
    hasher.update(&length.to_le_bytes());
    hasher.update(tree_root);
    hasher.finalize()
}

fn check_range(range: &Range<u64>, length: u64) -> Result<(), ProofError> {
    if range.start > range.end || range.end > length {
        return Err(ProofError::Range {
            start: range.start,
            end: range.end,
            length,
        });
    }
    Ok(())
}

impl ListProof {
    /// Check the proof against `expected_root` and return the elements of `range`.
    pub fn verify(
        &self,
        expected_root: &Hash,
        range: Range<u64>,
    ) -> Result<Vec<(u64, Vec<u8>)>, ProofError> {
        if self.length > MAX_LIST_SIZE {
            return Err(ProofError::corrupted(format!(
                "list length {} exceeds 2^56",
                self.length
            )));
        }
        check_range(&range, self.length)?;

        let elements = self.index_elements()?;
        if elements.len() as u64 != range.end - range.start
            || elements.keys().any(|index| !range.contains(index))
        {
            return Err(ProofError::corrupted(format!(
                "elements do not cover range [{}, {})",
                range.start, range.end
            )));
        }

        let root = self.compute_root(&elements)?;
        if &root != expected_root {
            return Err(ProofError::corrupted(format!(
                "list root {} does not match expected {}",
                hex::encode(root),
                hex::encode(expected_root)
            )));
        }
        Ok(elements.into_iter().collect())
    }

    fn index_elements(&self) -> Result<BTreeMap<u64, Vec<u8>>, ProofError> {
        let mut elements = BTreeMap::new();
        for ListElement { index, value } in &self.elements {
            if *index >= self.length {
                return Err(ProofError::corrupted(format!(
                    "element at index {index} outside list of length {}",
                    self.length
                )));
            }
            if elements.insert(*index, value.clone()).is_some() {
                return Err(ProofError::corrupted(format!(
                    "duplicate element at index {index}"
                )));
            }
        }
        Ok(elements)
    }

    fn compute_root(&self, elements: &BTreeMap<u64, Vec<u8>>) -> Result<Hash, ProofError> {
        let height = tree_height(self.length);

        if self.length == 0 {
            if !self.proof.is_empty() {
                return Err(ProofError::corrupted("proof nodes for an empty list"));
            }
            return Ok(list_hash(0, &[0u8; 32]));
        }

        if elements.is_empty() {
            return match self.proof.as_slice() {
                [node] if node.height == height && node.index == 0 => {
                    Ok(list_hash(self.length, &node.hash))
                }
                [node] => Err(ProofError::corrupted(format!(
                    "empty range proof node at ({}, {}), expected ({height}, 0)",
                    node.height, node.index
                ))),
                nodes => Err(ProofError::corrupted(format!(
                    "empty range proof must have one node, has {}",
                    nodes.len()
                ))),
            };
        }

        let mut proof_by_height: Vec<BTreeMap<u64, Hash>> =
            vec![BTreeMap::new(); usize::from(height)];
        for node in &self.proof {
            let ListProofNode {
                height: h,
                index,
                hash,
            } = *node;
            if h >= height {
                return Err(ProofError::corrupted(format!(
                    "proof node at height {h}, tree height is {height}"
                )));
            }
            if index >= level_size(self.length, h) {
                return Err(ProofError::corrupted(format!(
                    "proof node index {index} outside level {h}"
                )));
            }
            if proof_by_height[usize::from(h)].insert(index, hash).is_some() {
                return Err(ProofError::corrupted(format!(
                    "multiple proof nodes at ({h}, {index})"
                )));
            }
        }

        let mut calculated: BTreeMap<u64, Hash> = elements
            .iter()
            .map(|(index, value)| (*index, leaf_hash(value)))
            .collect();

        for h in 0..height {
            let level_len = level_size(self.length, h);
            let proof_level = &proof_by_height[usize::from(h)];

            for index in calculated.keys() {
                let last_on_odd_level = level_len % 2 == 1 && *index == level_len - 1;
                if last_on_odd_level {
                    continue;
                }
                let sibling = index ^ 1;
                if !calculated.contains_key(&sibling) && !proof_level.contains_key(&sibling) {
                    return Err(ProofError::corrupted(format!(
                        "missing proof node at ({h}, {sibling})"
                    )));
                }
            }
            for index in proof_level.keys() {
                if calculated.contains_key(index) {
                    return Err(ProofError::corrupted(format!(
                        "proof node at ({h}, {index}) overlaps a computed node"
                    )));
                }
                if !calculated.contains_key(&(index ^ 1)) {
                    return Err(ProofError::corrupted(format!(
                        "redundant proof node at ({h}, {index})"
                    )));
                }
            }

            let mut merged = calculated;
            merged.extend(proof_level.iter().map(|(i, hash)| (*i, *hash)));

            let mut next = BTreeMap::new();
            for (index, hash) in &merged {
                if index % 2 == 1 {
                    continue;
                }
                next.insert(index / 2, branch_hash(hash, merged.get(&(index + 1))));
            }
            calculated = next;
        }

        calculated
            .get(&0)
            .map(|root| list_hash(self.length, root))
            .ok_or_else(|| ProofError::corrupted("no root computed"))
    }
}

// -----------------------------------------------------------------------------
// Builders (full list in hand)
// -----------------------------------------------------------------------------

/// All tree levels, leaves first; the last level holds the root.
fn levels(elements: &[Vec<u8>]) -> Vec<Vec<Hash>> {
    let mut levels = vec![elements.iter().map(|e| leaf_hash(e)).collect::<Vec<_>>()];
    while levels[levels.len() - 1].len() > 1 {
        let next = levels[levels.len() - 1]
            .chunks(2)
            .map(|pair| branch_hash(&pair[0], pair.get(1)))
            .collect();
        levels.push(next);
    }
    levels
}

/// Hash of a complete list.
pub fn list_root(elements: &[Vec<u8>]) -> Hash {
    if elements.is_empty() {
        return list_hash(0, &[0u8; 32]);
    }
    let levels = levels(elements);
    list_hash(elements.len() as u64, &levels[levels.len() - 1][0])
}

/// Build a proof for `range` against a complete list.
pub fn build_list_proof(elements: &[Vec<u8>], range: Range<u64>) -> Result<ListProof, ProofError> {
    let length = elements.len() as u64;
    check_range(&range, length)?;

    let mut proof = ListProof {
        length,
        proof: Vec::new(),
        elements: Vec::new(),
    };
    if length == 0 {
        return Ok(proof);
    }

    let levels = levels(elements);
    let height = tree_height(length);
    if range.is_empty() {
        proof.proof.push(ListProofNode {
            height,
            index: 0,
            hash: levels[usize::from(height)][0],
        });
        return Ok(proof);
    }

    for h in 0..height {
        let level = &levels[usize::from(h)];
        let lo = range.start >> h;
        let hi = (range.end - 1) >> h;
        if lo % 2 == 1 {
            proof.proof.push(ListProofNode {
                height: h,
                index: lo - 1,
                hash: level[(lo - 1) as usize],
            });
        }
        if hi % 2 == 0 && hi + 1 < level.len() as u64 {
            proof.proof.push(ListProofNode {
                height: h,
                index: hi + 1,
                hash: level[(hi + 1) as usize],
            });
        }
    }
    proof.elements = range
        .map(|index| ListElement {
            index,
            value: elements[index as usize].clone(),
        })
        .collect();
    Ok(proof)
}
