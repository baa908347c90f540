//! Signed credentials — issuance authenticated by the issuer's key.
//!
//! A ledger authenticates the account that issues a credential. Off-ledger,
//! the issuer signs the credential id instead, and the store checks that
//! the signing key's handle is the issuer the credential names.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::signing;
use crate::error::{DartError, Result};
use crate::expression::Expression;
use crate::principal::key::principal_for_key;
use crate::principal::{PrincipalKey, RoleName};

use super::Credential;

/// A credential together with its issuer's signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedCredential {
    /// The credential being issued.
    pub credential: Credential,
    /// Issuer's public key (base64).
    pub issuer_key: String,
    /// Signing timestamp (microseconds since epoch).
    pub issued_at: u64,
    /// Issuer's signature over the signing message (base64).
    pub signature: String,
}

impl SignedCredential {
    /// Check the signature, the issuer binding and the credential id.
    pub fn verify_signature(&self) -> Result<()> {
        if !self.credential.has_consistent_id() {
            return Err(DartError::SignatureInvalid);
        }

        let key = Ed25519KeyPair::verifying_key_from_base64(&self.issuer_key)?;
        let signer = principal_for_key(&key);
        if signer != self.credential.issuer {
            return Err(DartError::IssuerMismatch {
                claimed: self.credential.issuer.to_string(),
                actual: signer.to_string(),
            });
        }

        signing::verify_issuance(&key, &self.credential.id, self.issued_at, &self.signature)
    }
}

/// Builder for credentials signed by their issuer.
pub struct CredentialBuilder {
    role: RoleName,
    source: Expression,
    weight: u32,
}

impl CredentialBuilder {
    /// Start a credential `issuer.role ← source` at full weight.
    pub fn new(role: RoleName, source: Expression) -> Self {
        Self {
            role,
            source,
            weight: super::MAX_WEIGHT as u32,
        }
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Sign as `issuer`, who becomes the credential's issuer.
    pub fn sign(self, issuer: &PrincipalKey) -> Result<SignedCredential> {
        let credential = Credential::new(issuer.principal(), self.role, self.source, self.weight)?;
        let issued_at = crate::time::now_micros();
        let signature = signing::sign_issuance(issuer.signing_key(), &credential.id, issued_at);

        Ok(SignedCredential {
            credential,
            issuer_key: issuer.public_key_base64(),
            issued_at,
            signature,
        })
    }
}
