//! Principals and role names.
//!
//! A principal is anyone who can issue credentials or hold role
//! memberships. A role is a (principal, role name) pair. Both identifiers
//! are opaque strings; the only structure imposed on them is the lexical
//! rule that keeps the expression text syntax unambiguous.

pub mod key;

use serde::{Deserialize, Serialize};

use crate::error::{DartError, Result};

pub use key::PrincipalKey;

/// Opaque, globally unique principal handle.
///
/// Key-backed principals use the account handle format `0x` + 40 hex
/// characters (see [`PrincipalKey::principal`]); any other lexically valid
/// handle is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(pub String);

impl Principal {
    /// Wrap a handle without validation.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Wrap a handle after checking it is usable inside expressions.
    pub fn parse(handle: &str) -> Result<Self> {
        validate_token(handle, "principal")?;
        Ok(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a role, scoped to the principal that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleName(pub String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn parse(name: &str) -> Result<Self> {
        validate_token(name, "role name")?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reject tokens that would collide with the expression separators.
fn validate_token(token: &str, what: &str) -> Result<()> {
    if token.is_empty() {
        return Err(DartError::InvalidExpression(format!("empty {what}")));
    }
    if let Some(bad) = token
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '.' | '&' | '∩'))
    {
        return Err(DartError::InvalidExpression(format!(
            "{what} '{token}' contains reserved character '{bad}'"
        )));
    }
    Ok(())
}
