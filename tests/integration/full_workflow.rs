//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Generate principal keys and declare roles
//! 2. Issue plain and signed credentials
//! 3. Save the store to a ledger file and load it back
//! 4. Search the loaded store
//! 5. Encode, verify and confirm every solution

use dart_rt::storage::{load_ledger, save_ledger};
use dart_rt::{
    confirm, encode_proof, prove, search, CredentialBuilder, DartError, Expression,
    LocalVerifier, MemoryStore, Principal, PrincipalKey, RoleName, Verifier,
};

#[test]
fn full_workflow_keys_to_verified_proofs() {
    // ── Step 1: Principals and roles ────────────────────────────────────
    let registry_key = PrincipalKey::generate();
    let registry = registry_key.principal();
    assert!(registry.as_str().starts_with("0x"));
    assert_eq!(registry.as_str().len(), 42);

    let clinic = Principal::new("clinic");
    let doctor = RoleName::new("doctor");
    let licensed = RoleName::new("licensed");

    let mut store = MemoryStore::new();
    store.declare_role(&registry, &licensed);
    store.declare_role(&clinic, &doctor);

    // ── Step 2: Issue credentials ───────────────────────────────────────
    for name in ["dr_a", "dr_b"] {
        let signed = CredentialBuilder::new(licensed.clone(), Expression::member(name))
            .weight(90)
            .sign(&registry_key)
            .expect("signing should succeed");
        assert!(signed.verify_signature().is_ok());
        store.submit(&signed).expect("signed credential accepted");
    }

    store
        .issue(
            &clinic,
            &doctor,
            Expression::role(registry.as_str(), licensed.as_str()),
            100,
        )
        .expect("issue should succeed");
    assert_eq!(store.len(), 3);

    // ── Step 3: Ledger round trip ───────────────────────────────────────
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledger.json");
    save_ledger(&path, &store).expect("save should succeed");
    let loaded = load_ledger(&path).expect("load should succeed");
    assert_eq!(loaded.len(), store.len());
    assert_eq!(
        loaded.records().iter().filter(|r| r.signature.is_some()).count(),
        2
    );

    // ── Step 4: Search ──────────────────────────────────────────────────
    let target = Expression::role("clinic", "doctor");
    let solutions = search(&loaded, &target);
    assert_eq!(solutions.len(), 2);
    assert!(solutions.values().all(|s| s.weight == 90));
    let original = search(&store, &target);
    assert!(original.keys().eq(solutions.keys()));

    // ── Step 5: Prove ───────────────────────────────────────────────────
    let verifier = LocalVerifier::new(&loaded);
    for solution in solutions.values() {
        let (proof, verified) = prove(&verifier, solution).expect("proof should verify");
        assert_eq!(proof.identifier_count(), 4);
        assert_eq!(verified.principal, clinic);
        assert_eq!(verified.role, doctor);
        assert_eq!(verified.member, solution.member);
    }
}

#[test]
fn workflow_unknown_role_rejected() {
    let mut store = MemoryStore::new();
    let err = store
        .issue(
            &Principal::new("ghost"),
            &RoleName::new("r"),
            Expression::member("m"),
            100,
        )
        .unwrap_err();
    assert!(matches!(err, DartError::UnknownRole { .. }));
}

#[test]
fn workflow_forged_issuer_rejected() {
    let mallory = PrincipalKey::generate();
    let victim = PrincipalKey::generate();

    let mut store = MemoryStore::new();
    store.declare_role(&victim.principal(), &RoleName::new("admin"));

    let mut signed = CredentialBuilder::new(RoleName::new("admin"), Expression::member("mallory"))
        .sign(&mallory)
        .expect("signing should succeed");
    // Re-label the credential as if the victim had issued it.
    signed.credential = dart_rt::Credential::new(
        victim.principal(),
        RoleName::new("admin"),
        Expression::member("mallory"),
        100,
    )
    .expect("credential");

    assert!(store.submit(&signed).is_err());
    assert!(store.is_empty());
}

#[test]
fn workflow_intersection_matches_both_sides() {
    let mut store = MemoryStore::new();
    let a = Principal::new("a");
    let b = Principal::new("b");
    let r = RoleName::new("r");
    store.declare_role(&a, &r);
    store.declare_role(&b, &r);
    for name in ["m1", "m2", "m3"] {
        store.issue(&a, &r, Expression::member(name), 100).unwrap();
    }
    for name in ["m2", "m3", "m4"] {
        store.issue(&b, &r, Expression::member(name), 100).unwrap();
    }

    let left: Vec<Principal> = search(&store, &Expression::role("a", "r"))
        .into_values()
        .map(|s| s.member)
        .collect();
    let right: Vec<Principal> = search(&store, &Expression::role("b", "r"))
        .into_values()
        .map(|s| s.member)
        .collect();
    let mut both: Vec<Principal> = search(&store, &Expression::intersection("a", "r", "b", "r"))
        .into_values()
        .map(|s| s.member)
        .collect();
    both.sort();

    let mut expected: Vec<Principal> = left.into_iter().filter(|m| right.contains(m)).collect();
    expected.sort();
    assert_eq!(both, expected);
    assert_eq!(both, vec![Principal::new("m2"), Principal::new("m3")]);
}

#[test]
fn workflow_inconsistent_verification_surfaces() {
    let mut store = MemoryStore::new();
    let a = Principal::new("a");
    let r = RoleName::new("r");
    store.declare_role(&a, &r);
    store.issue(&a, &r, Expression::member("m1"), 100).unwrap();
    store.issue(&a, &r, Expression::member("m2"), 100).unwrap();

    let solutions = search(&store, &Expression::role("a", "r"));
    let mut iter = solutions.values();
    let first = iter.next().unwrap();
    let second = iter.next().unwrap();

    // Verify the second solution's proof, then confirm it against the first.
    let proof = encode_proof(second);
    let verified = LocalVerifier::new(&store)
        .verify_proof(&proof.steps, proof.req_stack_size)
        .unwrap();
    let err = confirm(first, &verified).unwrap_err();
    assert!(matches!(err, DartError::InconsistentVerification { .. }));
}
