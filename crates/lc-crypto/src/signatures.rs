//! # Ed25519 Signatures
//!
//! Key generation, signing and verification for transactions and block
//! precommits.
//!
//! ## Security Properties
//!
//! - No RNG dependency when signing (deterministic nonce from message)
//! - `verify` accepts raw slices from the network and returns `false` on any
//!   malformed input instead of failing loudly

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// Public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Secret key length in bytes (seed followed by the public key).
pub const SECRET_KEY_LENGTH: usize = 64;
/// Signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Wrap raw bytes. No curve check, keys from the network are validated
    /// lazily by `verify`.
    pub const fn new(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; PUBLIC_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_slice(&hex::decode(s)?)
    }

    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Check that the bytes decode to a point on the curve.
    pub fn validate(&self) -> Result<(), CryptoError> {
        VerifyingKey::from_bytes(&self.0)
            .map(|_| ())
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Verify a signature made by this key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        verify(signature.as_bytes(), &self.0, message)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Create from bytes.
    pub const fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SIGNATURE_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: SIGNATURE_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_slice(&hex::decode(s)?)
    }

    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}

/// Ed25519 secret key material: 32-byte seed followed by the public key.
pub struct SecretKey([u8; SECRET_KEY_LENGTH]);

impl SecretKey {
    /// Create from a slice, checking the length and that the public half
    /// matches the seed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SECRET_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SECRET_KEY_LENGTH,
                    actual: bytes.len(),
                })?;
        SigningKey::from_keypair_bytes(&array).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self(array))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LENGTH] {
        &self.0
    }

    fn signing_key(&self) -> SigningKey {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&self.0[..32]);
        let key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        key
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Ed25519 key pair.
#[derive(Debug)]
pub struct KeyPair {
    public_key: PublicKey,
    secret_key: SecretKey,
}

impl KeyPair {
    /// Create from a secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&seed))
    }

    /// Restore from 64-byte secret key material.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey(secret_key.signing_key().verifying_key().to_bytes());
        Self {
            public_key,
            secret_key,
        }
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        Self {
            public_key: PublicKey(signing_key.verifying_key().to_bytes()),
            secret_key: SecretKey(signing_key.to_keypair_bytes()),
        }
    }

    /// Get public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Get secret key.
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Sign a message (deterministic).
    pub fn sign(&self, message: &[u8]) -> Signature {
        sign(&self.secret_key, message)
    }
}

/// Generate a random key pair from the OS RNG.
pub fn generate_key_pair() -> KeyPair {
    KeyPair::from_signing_key(SigningKey::generate(&mut rand::rngs::OsRng))
}

/// Random 64-bit nonce for anti-replay fields.
pub fn generate_seed() -> u64 {
    rand::rngs::OsRng.next_u64()
}

/// Sign a message with secret key material.
pub fn sign(secret_key: &SecretKey, message: &[u8]) -> Signature {
    Signature(secret_key.signing_key().sign(message).to_bytes())
}

/// Verify `signature` over `message` under `public_key`.
///
/// Inputs come straight from untrusted responses; any malformed input
/// (wrong length, key off the curve) yields `false`.
pub fn verify(signature: &[u8], public_key: &[u8], message: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(public_key) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key.verify(message, &sig).is_ok()
}

macro_rules! impl_hex_serde {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $ty::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_hex_serde!(PublicKey);
impl_hex_serde!(Signature);
