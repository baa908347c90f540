//! Query expressions — the four shapes of member sets.
//!
//! Every expression has a content-addressed [`ExpressionId`]: the same
//! logical expression always hashes to the same identifier, so paths found
//! in different searches (and proofs checked against different store
//! snapshots) stay comparable.
//!
//! Text syntax:
//!
//! ```text
//! alice               SimpleMember(alice)
//! eorg.member         SimpleInclusion(eorg, member)
//! eorg.university.student
//!                     LinkedInclusion(eorg, university, student)
//! eorg.student & eorg.member
//!                     IntersectionInclusion(eorg, student, eorg, member)
//! ```
//!
//! `∩` is accepted in place of `&`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DartError, Result};
use crate::principal::{Principal, RoleName};

/// Stable identifier of an [`Expression`].
///
/// Format: `expr_` + base58 of the first 16 bytes of SHA-256 over the
/// canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpressionId(pub String);

impl std::fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A query denoting a set of members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// The singleton set `{member}`.
    SimpleMember { member: Principal },
    /// The members of `principal.role`.
    SimpleInclusion { principal: Principal, role: RoleName },
    /// The union of `x.role_b` over every `x` in `principal.role_a`.
    LinkedInclusion {
        principal: Principal,
        role_a: RoleName,
        role_b: RoleName,
    },
    /// The intersection of `principal_a.role_a` and `principal_b.role_b`.
    IntersectionInclusion {
        principal_a: Principal,
        role_a: RoleName,
        principal_b: Principal,
        role_b: RoleName,
    },
}

/// Discriminant of an [`Expression`], handy for logging and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    SimpleMember,
    SimpleInclusion,
    LinkedInclusion,
    IntersectionInclusion,
}

impl ExpressionKind {
    fn tag(self) -> u8 {
        match self {
            Self::SimpleMember => 0x01,
            Self::SimpleInclusion => 0x02,
            Self::LinkedInclusion => 0x03,
            Self::IntersectionInclusion => 0x04,
        }
    }
}

impl Expression {
    pub fn member(member: impl Into<String>) -> Self {
        Self::SimpleMember {
            member: Principal::new(member),
        }
    }

    pub fn role(principal: impl Into<String>, role: impl Into<String>) -> Self {
        Self::SimpleInclusion {
            principal: Principal::new(principal),
            role: RoleName::new(role),
        }
    }

    pub fn linked(
        principal: impl Into<String>,
        role_a: impl Into<String>,
        role_b: impl Into<String>,
    ) -> Self {
        Self::LinkedInclusion {
            principal: Principal::new(principal),
            role_a: RoleName::new(role_a),
            role_b: RoleName::new(role_b),
        }
    }

    pub fn intersection(
        principal_a: impl Into<String>,
        role_a: impl Into<String>,
        principal_b: impl Into<String>,
        role_b: impl Into<String>,
    ) -> Self {
        Self::IntersectionInclusion {
            principal_a: Principal::new(principal_a),
            role_a: RoleName::new(role_a),
            principal_b: Principal::new(principal_b),
            role_b: RoleName::new(role_b),
        }
    }

    /// `SimpleInclusion` over already-typed identifiers.
    pub fn of_role(principal: &Principal, role: &RoleName) -> Self {
        Self::SimpleInclusion {
            principal: principal.clone(),
            role: role.clone(),
        }
    }

    pub fn kind(&self) -> ExpressionKind {
        match self {
            Self::SimpleMember { .. } => ExpressionKind::SimpleMember,
            Self::SimpleInclusion { .. } => ExpressionKind::SimpleInclusion,
            Self::LinkedInclusion { .. } => ExpressionKind::LinkedInclusion,
            Self::IntersectionInclusion { .. } => ExpressionKind::IntersectionInclusion,
        }
    }

    /// The (principal, role) pair when this expression is a plain role.
    pub fn as_role(&self) -> Option<(&Principal, &RoleName)> {
        match self {
            Self::SimpleInclusion { principal, role } => Some((principal, role)),
            _ => None,
        }
    }

    /// Both sides of an intersection, as role expressions.
    pub fn intersection_sides(&self) -> Option<(Expression, Expression)> {
        match self {
            Self::IntersectionInclusion {
                principal_a,
                role_a,
                principal_b,
                role_b,
            } => Some((
                Self::of_role(principal_a, role_a),
                Self::of_role(principal_b, role_b),
            )),
            _ => None,
        }
    }

    /// Canonical byte encoding: a variant tag followed by each field as a
    /// big-endian u32 length and its UTF-8 bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let fields: Vec<&str> = match self {
            Self::SimpleMember { member } => vec![member.as_str()],
            Self::SimpleInclusion { principal, role } => vec![principal.as_str(), role.as_str()],
            Self::LinkedInclusion {
                principal,
                role_a,
                role_b,
            } => vec![principal.as_str(), role_a.as_str(), role_b.as_str()],
            Self::IntersectionInclusion {
                principal_a,
                role_a,
                principal_b,
                role_b,
            } => vec![
                principal_a.as_str(),
                role_a.as_str(),
                principal_b.as_str(),
                role_b.as_str(),
            ],
        };

        let mut out = vec![self.kind().tag()];
        for field in fields {
            out.extend_from_slice(&(field.len() as u32).to_be_bytes());
            out.extend_from_slice(field.as_bytes());
        }
        out
    }

    /// Content-addressed identifier of this expression.
    pub fn id(&self) -> ExpressionId {
        let hash = Sha256::digest(self.canonical_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        ExpressionId(format!("expr_{encoded}"))
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SimpleMember { member } => write!(f, "{member}"),
            Self::SimpleInclusion { principal, role } => write!(f, "{principal}.{role}"),
            Self::LinkedInclusion {
                principal,
                role_a,
                role_b,
            } => write!(f, "{principal}.{role_a}.{role_b}"),
            Self::IntersectionInclusion {
                principal_a,
                role_a,
                principal_b,
                role_b,
            } => write!(f, "{principal_a}.{role_a} ∩ {principal_b}.{role_b}"),
        }
    }
}

impl std::str::FromStr for Expression {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some((left, right)) = s.split_once(|c| c == '&' || c == '∩') {
            let (principal_a, role_a) = parse_role(left.trim())?;
            let (principal_b, role_b) = parse_role(right.trim())?;
            return Ok(Self::IntersectionInclusion {
                principal_a,
                role_a,
                principal_b,
                role_b,
            });
        }

        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [member] => Ok(Self::SimpleMember {
                member: Principal::parse(member)?,
            }),
            [principal, role] => Ok(Self::SimpleInclusion {
                principal: Principal::parse(principal)?,
                role: RoleName::parse(role)?,
            }),
            [principal, role_a, role_b] => Ok(Self::LinkedInclusion {
                principal: Principal::parse(principal)?,
                role_a: RoleName::parse(role_a)?,
                role_b: RoleName::parse(role_b)?,
            }),
            _ => Err(DartError::InvalidExpression(format!(
                "'{s}' has too many '.' separated parts"
            ))),
        }
    }
}

fn parse_role(s: &str) -> Result<(Principal, RoleName)> {
    match s.split_once('.') {
        Some((principal, role)) => Ok((Principal::parse(principal)?, RoleName::parse(role)?)),
        None => Err(DartError::InvalidExpression(format!(
            "'{s}' is not a role (expected principal.role)"
        ))),
    }
}
