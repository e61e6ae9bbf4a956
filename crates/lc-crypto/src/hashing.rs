//! # SHA-256 Hashing
//!
//! One-shot and streaming SHA-256, the hash function behind transaction
//! hashes, block hashes and every Merkle node the light client recomputes.

use sha2::{Digest, Sha256};

/// Size of a hash in bytes.
pub const HASH_SIZE: usize = 32;

/// SHA-256 hash output (256-bit).
pub type Hash = [u8; HASH_SIZE];

/// Stateful SHA-256 hasher.
#[derive(Clone, Default)]
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Update with a single byte (domain separation tags).
    pub fn update_byte(&mut self, byte: u8) -> &mut Self {
        self.inner.update([byte]);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        self.inner.finalize().into()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn hash(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash multiple inputs as one concatenated message.
pub fn hash_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // SHA-256("abc")
        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(hex::encode(hash(b"abc")), expected);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash(b"test"), hash(b"test"));
        assert_ne!(hash(b"input1"), hash(b"input2"));
    }

    #[test]
    fn test_streaming() {
        let oneshot = hash(b"hello world");

        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello ").update(b"world");
        assert_eq!(oneshot, hasher.finalize());
    }

    #[test]
    fn test_hash_many_matches_concat() {
        assert_eq!(hash_many(&[b"ab", b"c"]), hash(b"abc"));
    }

    #[test]
    fn test_update_byte() {
        let mut hasher = Sha256Hasher::new();
        hasher.update_byte(0x01).update(b"x");
        assert_eq!(hasher.finalize(), hash(&[0x01, b'x']));
    }
}
