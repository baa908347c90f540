//! Issuance signatures.
//!
//! An issuer signs `dart-credential:<credential id>:<issued_at>`. Binding
//! the content-addressed id covers issuer, role, source and weight at once;
//! binding the timestamp stops a signature being replayed onto a record
//! with a different issue time. Signatures travel as base64 text.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::credential::CredentialId;
use crate::error::{DartError, Result};

const DOMAIN: &str = "dart-credential";

/// The exact bytes an issuer signs.
pub fn issuance_message(credential: &CredentialId, issued_at: u64) -> Vec<u8> {
    format!("{DOMAIN}:{credential}:{issued_at}").into_bytes()
}

/// Sign an issuance and return the base64 signature.
pub fn sign_issuance(
    signing_key: &SigningKey,
    credential: &CredentialId,
    issued_at: u64,
) -> String {
    let signature = signing_key.sign(&issuance_message(credential, issued_at));
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signature.to_bytes())
}

/// Check a base64 issuance signature.
pub fn verify_issuance(
    verifying_key: &VerifyingKey,
    credential: &CredentialId,
    issued_at: u64,
    signature_b64: &str,
) -> Result<()> {
    let signature = decode_signature(signature_b64)?;
    verifying_key
        .verify(&issuance_message(credential, issued_at), &signature)
        .map_err(|_| DartError::SignatureInvalid)
}

fn decode_signature(encoded: &str) -> Result<Signature> {
    let raw = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
        .map_err(|e| DartError::InvalidKey(format!("invalid base64 signature: {e}")))?;
    let bytes: [u8; 64] = raw
        .try_into()
        .map_err(|_| DartError::InvalidKey("signature must be 64 bytes".into()))?;
    Ok(Signature::from_bytes(&bytes))
}
