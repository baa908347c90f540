//! Proof encoding — turning a solution path into a verifier program.
//!
//! A proof is a sequence of `(to, from)` expression-id pairs in replay
//! order: the path is walked from the member's leaf back up to the target.
//! Edges whose destination is a `LinkedInclusion` are left out; the
//! verifier rebuilds a linked derivation from the two single-hop
//! derivations already on its stack.

use serde::{Deserialize, Serialize};

use crate::error::{DartError, Result};
use crate::expression::{Expression, ExpressionId};
use crate::resolver::{PathEdge, Solution};

/// One verifier instruction: `from` derives `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofStep {
    pub to: ExpressionId,
    pub from: ExpressionId,
}

/// An encoded proof plus the stack depth needed to replay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub steps: Vec<ProofStep>,
    pub req_stack_size: usize,
}

impl Proof {
    /// Total identifiers carried by the proof (two per step).
    pub fn identifier_count(&self) -> usize {
        self.steps.len() * 2
    }

    /// The proof as a flat identifier sequence `to, from, to, from, ...`.
    pub fn flatten(&self) -> Vec<ExpressionId> {
        self.steps
            .iter()
            .flat_map(|step| [step.to.clone(), step.from.clone()])
            .collect()
    }

    /// Rebuild a proof from a flat identifier sequence.
    pub fn from_flat(ids: &[ExpressionId], req_stack_size: usize) -> Result<Self> {
        if ids.len() % 2 != 0 {
            return Err(DartError::invalid_proof(format!(
                "odd identifier count {}",
                ids.len()
            )));
        }
        let steps = ids
            .chunks_exact(2)
            .map(|pair| ProofStep {
                to: pair[0].clone(),
                from: pair[1].clone(),
            })
            .collect();
        Ok(Self {
            steps,
            req_stack_size,
        })
    }
}

/// Encode a solution's path as a proof.
pub fn encode_proof(solution: &Solution) -> Proof {
    let steps = replay_edges(&solution.path)
        .map(|edge| ProofStep {
            to: edge.to_id.clone(),
            from: edge.from_id.clone(),
        })
        .collect();
    Proof {
        steps,
        req_stack_size: solution.req_stack_size,
    }
}

/// Highest stack depth a verifier reaches while replaying `path`.
///
/// Mirrors the verifier's stack discipline: a member leaf is pushed before
/// it is consumed, a linked source consumes two entries, and the second
/// side of an intersection completes the half-proven entry below it in
/// place.
pub fn required_stack_depth(path: &[PathEdge]) -> usize {
    // `Some(id)` marks a half-proven intersection.
    let mut stack: Vec<Option<&ExpressionId>> = Vec::new();
    let mut high = 0;

    for edge in replay_edges(path) {
        match &edge.from {
            Expression::SimpleMember { .. } => {
                stack.push(None);
                high = high.max(stack.len());
                stack.pop();
            }
            Expression::LinkedInclusion { .. } => {
                stack.pop();
                stack.pop();
            }
            _ => {
                stack.pop();
            }
        }

        if matches!(edge.to, Expression::IntersectionInclusion { .. }) {
            if stack.last() == Some(&Some(&edge.to_id)) {
                stack.pop();
                stack.push(None);
            } else {
                stack.push(Some(&edge.to_id));
            }
        } else {
            stack.push(None);
        }
        high = high.max(stack.len());
    }
    high
}

fn replay_edges(path: &[PathEdge]) -> impl Iterator<Item = &PathEdge> {
    path.iter()
        .rev()
        .filter(|edge| !matches!(edge.to, Expression::LinkedInclusion { .. }))
}
