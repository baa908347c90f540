//! Search results.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::expression::{Expression, ExpressionId};
use crate::graph::EdgeKind;
use crate::principal::Principal;

/// Content-addressed identifier of a solution.
///
/// Format: `sol_` + base58 of the first 16 bytes of SHA-256 over the member
/// and every path edge's (to, from) identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SolutionId(pub String);

impl SolutionId {
    pub fn compute(member: &Principal, path: &[PathEdge]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((member.as_str().len() as u32).to_be_bytes());
        hasher.update(member.as_str().as_bytes());
        for edge in path {
            hasher.update(edge.to_id.0.as_bytes());
            hasher.update(b"<-");
            hasher.update(edge.from_id.0.as_bytes());
            hasher.update(b";");
        }
        let hash = hasher.finalize();
        Self(format!("sol_{}", bs58::encode(&hash[..16]).into_string()))
    }
}

impl std::fmt::Display for SolutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One derivation edge of a solution path, detached from the search graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEdge {
    pub to: Expression,
    pub to_id: ExpressionId,
    pub from: Expression,
    pub from_id: ExpressionId,
    pub weight: u8,
    pub kind: EdgeKind,
}

impl std::fmt::Display for PathEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ←- {}", self.to, self.from)
    }
}

/// A member satisfying the search target, with the path that proves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    /// The expression that was searched.
    pub target: Expression,
    pub member: Principal,
    /// Edges from the target down to the member's `SimpleMember` leaf.
    pub path: Vec<PathEdge>,
    /// Aggregated trust weight, 1..=100.
    pub weight: u8,
    /// Stack depth the verifier needs to replay this solution's proof.
    pub req_stack_size: usize,
}
