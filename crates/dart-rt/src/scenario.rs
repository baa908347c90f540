//! The EPapers access policy, as a ready-made fixture.
//!
//! EPapers grants `canAccess` to anyone who is both a student and a member
//! of EOrg. EOrg recognises the universities accredited by StateA, and the
//! students of those universities:
//!
//! ```text
//! epapers.canAccess  ←- eorg.student ∩ eorg.member      (50)
//! eorg.student       ←- eorg.university.student         (100)
//! eorg.university    ←- state_a.university              (100)
//! state_a.university ←- uni_k                           (100)
//! uni_k.student      ←- principal_i                     (100)
//! eorg.member        ←- principal_i                     (100)
//! ```
//!
//! Eligible principals are spread round-robin across the universities.

use crate::error::Result;
use crate::expression::Expression;
use crate::principal::{Principal, RoleName};
use crate::store::MemoryStore;

/// A populated store plus the names needed to query it.
#[derive(Debug, Clone)]
pub struct EPapersPolicy {
    pub store: MemoryStore,
    /// `epapers.canAccess`.
    pub target: Expression,
    pub eligibles: Vec<Principal>,
    pub universities: Vec<Principal>,
}

/// Build the policy with `n_eligibles` principals and `n_universities`
/// universities.
pub fn build(n_eligibles: usize, n_universities: usize) -> Result<EPapersPolicy> {
    let epapers = Principal::new("epapers");
    let eorg = Principal::new("eorg");
    let state_a = Principal::new("state_a");

    let can_access = RoleName::new("canAccess");
    let student = RoleName::new("student");
    let member = RoleName::new("member");
    let university = RoleName::new("university");

    let eligibles: Vec<Principal> = (1..=n_eligibles)
        .map(|i| Principal::new(format!("principal_{i}")))
        .collect();
    let universities: Vec<Principal> = (1..=n_universities)
        .map(|i| Principal::new(format!("uni_{i}")))
        .collect();

    let mut store = MemoryStore::new();
    store.declare_role(&epapers, &can_access);
    store.declare_role(&eorg, &student);
    store.declare_role(&eorg, &member);
    store.declare_role(&eorg, &university);
    store.declare_role(&state_a, &university);
    for uni in &universities {
        store.declare_role(uni, &student);
    }

    for (i, principal) in eligibles.iter().enumerate() {
        store.issue(&eorg, &member, Expression::member(principal.as_str()), 100)?;
        if let Some(uni) = universities.get(i % universities.len().max(1)) {
            store.issue(uni, &student, Expression::member(principal.as_str()), 100)?;
        }
    }
    for uni in &universities {
        store.issue(&state_a, &university, Expression::member(uni.as_str()), 100)?;
    }

    store.issue(
        &eorg,
        &university,
        Expression::of_role(&state_a, &university),
        100,
    )?;
    store.issue(
        &eorg,
        &student,
        Expression::linked(eorg.as_str(), university.as_str(), student.as_str()),
        100,
    )?;
    store.issue(
        &epapers,
        &can_access,
        Expression::intersection(eorg.as_str(), student.as_str(), eorg.as_str(), member.as_str()),
        50,
    )?;

    log::debug!(
        "built EPapers policy: {} eligibles, {} universities, {} credentials",
        n_eligibles,
        n_universities,
        store.len()
    );

    Ok(EPapersPolicy {
        store,
        target: Expression::of_role(&epapers, &can_access),
        eligibles,
        universities,
    })
}
