//! Credentials — issued statements that a set of members is included in a
//! role at some trust weight.
//!
//! `issuer.role ← source (weight)` reads "every member of `source` is a
//! member of `issuer.role`, trusted at `weight` out of 100". Credentials are
//! immutable once issued; revocation is expressed by issuing further
//! credentials, never by editing existing ones.

pub mod signed;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DartError, Result};
use crate::expression::{Expression, ExpressionId};
use crate::principal::{Principal, RoleName};

pub use signed::{CredentialBuilder, SignedCredential};

/// Highest trust weight a credential may carry.
pub const MAX_WEIGHT: u8 = 100;

/// Unique identifier for a credential.
///
/// Format: `cred_` + base58 of the first 16 bytes of SHA-256 over issuer,
/// role, source expression id and weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialId(pub String);

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier returned when a role is declared.
///
/// Format: `role_` + base58 digest of the role's `SimpleInclusion` id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn for_role(principal: &Principal, role: &RoleName) -> Self {
        let expr_id = Expression::of_role(principal, role).id();
        let hash = Sha256::digest(expr_id.0.as_bytes());
        Self(format!("role_{}", bs58::encode(&hash[..16]).into_string()))
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An issued trust statement `issuer.role ← source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Content-addressed credential ID.
    pub id: CredentialId,
    /// Principal owning the destination role.
    pub issuer: Principal,
    /// Destination role name, scoped to `issuer`.
    pub role: RoleName,
    /// Set of members being included.
    pub source: Expression,
    /// Trust weight, 0..=100.
    pub weight: u8,
}

impl Credential {
    /// Build a credential, validating the weight.
    pub fn new(issuer: Principal, role: RoleName, source: Expression, weight: u32) -> Result<Self> {
        if weight > MAX_WEIGHT as u32 {
            return Err(DartError::InvalidWeight(weight));
        }
        let weight = weight as u8;
        let id = compute_id(&issuer, &role, &source, weight);
        Ok(Self {
            id,
            issuer,
            role,
            source,
            weight,
        })
    }

    /// The role this credential feeds, as an expression.
    pub fn destination(&self) -> Expression {
        Expression::of_role(&self.issuer, &self.role)
    }

    pub fn destination_id(&self) -> ExpressionId {
        self.destination().id()
    }

    /// Whether `id` matches the credential's fields.
    pub fn has_consistent_id(&self) -> bool {
        compute_id(&self.issuer, &self.role, &self.source, self.weight) == self.id
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} ←- {} ({})",
            self.issuer, self.role, self.source, self.weight
        )
    }
}

fn compute_id(issuer: &Principal, role: &RoleName, source: &Expression, weight: u8) -> CredentialId {
    let mut hasher = Sha256::new();
    for field in [issuer.as_str(), role.as_str(), source.id().0.as_str()] {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update([weight]);
    let hash = hasher.finalize();
    CredentialId(format!("cred_{}", bs58::encode(&hash[..16]).into_string()))
}
