//! # Block Proof Verification
//!
//! A block is trusted once strictly more than two thirds of the validator
//! set have signed its canonical header encoding.

use super::codec::encode_block_header;
use crate::domain::{BlockProof, Hash, LightClientError, ValidatorSet};
use std::collections::HashSet;

/// Verify the precommits of a block and return its hash.
///
/// Any precommit from outside the set, a repeated validator or a bad
/// signature rejects the whole proof rather than being skipped.
pub fn verify_block_proof(
    proof: &BlockProof,
    validators: &ValidatorSet,
) -> Result<Hash, LightClientError> {
    let total = validators.len();
    let required = validators.quorum();
    let untrusted = |signed: usize| LightClientError::UntrustedBlock {
        signed,
        required,
        total,
    };

    if validators.is_empty() {
        return Err(untrusted(0));
    }

    let message = encode_block_header(&proof.block);
    let mut signers = HashSet::with_capacity(proof.precommits.len());
    for precommit in &proof.precommits {
        if !validators.contains(&precommit.validator) {
            return Err(untrusted(signers.len()));
        }
        if !signers.insert(precommit.validator) {
            return Err(untrusted(signers.len()));
        }
        if !precommit.validator.verify(&message, &precommit.signature) {
            return Err(untrusted(signers.len() - 1));
        }
    }

    let signed = signers.len();
    if 3 * signed <= 2 * total {
        return Err(untrusted(signed));
    }
    Ok(lc_crypto::hash(&message))
}
