//! Concurrency test: parallel searches and verifications over one snapshot.
//!
//! Validates that a frozen store can be shared across threads and that every
//! thread sees the same solutions and verification outcomes.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::thread;

use dart_rt::scenario;
use dart_rt::{prove, prove_all, search, LocalVerifier, SolutionId};

#[test]
fn stress_32_concurrent_searchers() {
    let policy = Arc::new(scenario::build(12, 3).expect("policy should build"));
    let results = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let policy = Arc::clone(&policy);
        let results = Arc::clone(&results);
        let handle = thread::spawn(move || {
            for _ in 0..10 {
                let ids: BTreeSet<SolutionId> = search(&policy.store, &policy.target)
                    .into_keys()
                    .collect();
                results.lock().unwrap().push(ids);
            }
        });
        handles.push(handle);
    }

    for h in handles {
        h.join().unwrap();
    }

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 320);
    let first = &results[0];
    assert_eq!(first.len(), 12);
    assert!(results.iter().all(|ids| ids == first));
}

#[test]
fn stress_concurrent_verifiers() {
    let policy = Arc::new(scenario::build(8, 2).expect("policy should build"));
    let solutions = Arc::new(search(&policy.store, &policy.target));
    let verified = Arc::new(Mutex::new(0usize));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let policy = Arc::clone(&policy);
        let solutions = Arc::clone(&solutions);
        let verified = Arc::clone(&verified);
        let handle = thread::spawn(move || {
            let verifier = LocalVerifier::new(&policy.store);
            for solution in solutions.values() {
                prove(&verifier, solution).expect("proof should verify");
                *verified.lock().unwrap() += 1;
            }
        });
        handles.push(handle);
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(*verified.lock().unwrap(), 16 * 8);
}

#[test]
fn stress_prove_all_matches_sequential() {
    let policy = scenario::build(20, 4).expect("policy should build");
    let solutions = search(&policy.store, &policy.target);
    let verifier = LocalVerifier::new(&policy.store);

    let parallel = prove_all(&verifier, &solutions);
    assert_eq!(parallel.len(), solutions.len());

    for (id, outcome) in parallel {
        let (proof, verified) = outcome.expect("parallel proof should verify");
        let (seq_proof, seq_verified) =
            prove(&verifier, &solutions[&id]).expect("sequential proof should verify");
        assert_eq!(proof, seq_proof);
        assert_eq!(verified, seq_verified);
    }
}
