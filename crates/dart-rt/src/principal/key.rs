//! Principal keys — Ed25519 key pairs that issue signed credentials.
//!
//! The public key IS the principal: its handle is derived from the
//! verifying key, so a store can check that whoever signed a credential is
//! the issuer it names.

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::crypto::keys::Ed25519KeyPair;

use super::Principal;

/// An Ed25519-backed principal.
pub struct PrincipalKey {
    key_pair: Ed25519KeyPair,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
}

impl PrincipalKey {
    /// Create a principal with a fresh key pair.
    pub fn generate() -> Self {
        Self {
            key_pair: Ed25519KeyPair::generate(),
            created_at: crate::time::now_micros(),
        }
    }

    /// Reconstruct from existing signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32], created_at: u64) -> Self {
        Self {
            key_pair: Ed25519KeyPair::from_signing_key_bytes(bytes),
            created_at,
        }
    }

    /// The principal handle derived from this key.
    pub fn principal(&self) -> Principal {
        principal_for_key(self.key_pair.verifying_key())
    }

    pub fn signing_key(&self) -> &SigningKey {
        self.key_pair.signing_key()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key_pair.verifying_key()
    }

    /// Return the public key as base64.
    pub fn public_key_base64(&self) -> String {
        self.key_pair.verifying_key_base64()
    }
}

/// Compute the account handle for a verifying key.
///
/// Format: `0x` + hex of the last 20 bytes of SHA-256(public_key).
pub fn principal_for_key(key: &VerifyingKey) -> Principal {
    let hash = Sha256::digest(key.as_bytes());
    Principal(format!("0x{}", hex::encode(&hash[12..])))
}
