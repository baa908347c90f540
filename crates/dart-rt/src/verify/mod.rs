//! Proof verification.
//!
//! The verifier is a boundary collaborator: callers hand it a proof and a
//! stack bound and get back the membership it actually proved. The
//! [`Verifier`] trait is the seam; [`LocalVerifier`] replays proofs against
//! any [`CredentialStore`] with a bounded stack machine.

mod machine;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DartError, Result};
use crate::principal::{Principal, RoleName};
use crate::proof::{encode_proof, Proof, ProofStep};
use crate::resolver::{Solution, SolutionId};
use crate::store::CredentialStore;

use machine::StackMachine;

/// The membership a verifier proved: `member ∈ principal.role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedMembership {
    pub principal: Principal,
    pub role: RoleName,
    pub member: Principal,
}

impl std::fmt::Display for VerifiedMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ∈ {}.{}", self.member, self.principal, self.role)
    }
}

/// Checks proofs against some view of the credential store.
pub trait Verifier {
    /// Replay `proof` with at most `req_stack_size` stack entries.
    fn verify_proof(&self, proof: &[ProofStep], req_stack_size: usize)
        -> Result<VerifiedMembership>;
}

/// Verifier reading credentials straight from a local store.
pub struct LocalVerifier<'s, S: CredentialStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: CredentialStore + ?Sized> LocalVerifier<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }
}

impl<S: CredentialStore + ?Sized> Verifier for LocalVerifier<'_, S> {
    fn verify_proof(
        &self,
        proof: &[ProofStep],
        req_stack_size: usize,
    ) -> Result<VerifiedMembership> {
        if proof.is_empty() {
            return Err(DartError::invalid_proof("empty proof"));
        }
        let mut machine = StackMachine::new(self.store, req_stack_size);
        for step in proof {
            machine.step(step)?;
        }
        let verified = machine.finish()?;
        log::debug!("verified {} in {} steps", verified, proof.len());
        Ok(verified)
    }
}

/// Compare what the verifier proved with what the solution claims.
pub fn confirm(solution: &Solution, verified: &VerifiedMembership) -> Result<()> {
    let consistent = match solution.target.as_role() {
        Some((principal, role)) => {
            *principal == verified.principal
                && *role == verified.role
                && solution.member == verified.member
        }
        None => false,
    };
    if consistent {
        Ok(())
    } else {
        Err(DartError::InconsistentVerification {
            expected: format!("{} ∈ {}", solution.member, solution.target),
            actual: verified.to_string(),
        })
    }
}

/// Encode, verify and confirm one solution.
pub fn prove<V: Verifier + ?Sized>(
    verifier: &V,
    solution: &Solution,
) -> Result<(Proof, VerifiedMembership)> {
    let proof = encode_proof(solution);
    let verified = verifier.verify_proof(&proof.steps, proof.req_stack_size)?;
    confirm(solution, &verified)?;
    Ok((proof, verified))
}

/// [`prove`] every solution, one verification per thread.
pub fn prove_all<V: Verifier + Sync + ?Sized>(
    verifier: &V,
    solutions: &BTreeMap<SolutionId, Solution>,
) -> Vec<(SolutionId, Result<(Proof, VerifiedMembership)>)> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = solutions
            .iter()
            .map(|(id, solution)| (id, scope.spawn(move || prove(verifier, solution))))
            .collect();

        handles
            .into_iter()
            .map(|(id, handle)| {
                let outcome = handle.join().unwrap_or_else(|_| {
                    Err(DartError::invalid_proof("verification thread panicked"))
                });
                (id.clone(), outcome)
            })
            .collect()
    })
}
