//! # LC Crypto - Signing and Hashing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Transaction hashes, Merkle nodes |
//! | `signatures` | Ed25519 | Transaction and precommit signatures |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Verification**: never panics on untrusted input, wrong lengths yield `false`
//! - **Key material**: secret keys are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{hash, hash_many, Hash, Sha256Hasher, HASH_SIZE};
pub use signatures::{
    generate_key_pair, generate_seed, sign, verify, KeyPair, PublicKey, SecretKey, Signature,
    PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
