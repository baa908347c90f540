//! Stress test: long delegation chains, nested linked roles and weight decay.

use dart_rt::{
    encode_proof, prove, search, Expression, LocalVerifier, MemoryStore, Principal, Resolver,
    RoleName, SearchOptions, Verifier, WeightRule,
};

/// p0.r ← p1.r ← ... ← p{depth}.r ← m, every credential at `weight`.
fn inclusion_chain(depth: usize, weight: u32) -> MemoryStore {
    let mut store = MemoryStore::new();
    let r = RoleName::new("r");
    for i in 0..=depth {
        store.declare_role(&Principal::new(format!("p{i}")), &r);
    }
    for i in 0..depth {
        store
            .issue(
                &Principal::new(format!("p{i}")),
                &r,
                Expression::role(format!("p{}", i + 1), "r"),
                weight,
            )
            .expect("issue should succeed");
    }
    store
        .issue(&Principal::new(format!("p{depth}")), &r, Expression::member("m"), weight)
        .expect("issue should succeed");
    store
}

#[test]
fn stress_inclusion_chain_depth_50() {
    let store = inclusion_chain(50, 100);
    let solutions = search(&store, &Expression::role("p0", "r"));
    assert_eq!(solutions.len(), 1);

    let solution = solutions.values().next().unwrap();
    assert_eq!(solution.path.len(), 51);
    assert_eq!(solution.weight, 100);
    assert_eq!(solution.req_stack_size, 1);

    let (proof, verified) =
        prove(&LocalVerifier::new(&store), solution).expect("chain should prove");
    assert_eq!(proof.identifier_count(), 102);
    assert_eq!(verified.principal, Principal::new("p0"));
}

#[test]
fn stress_weight_decay_along_chain() {
    let store = inclusion_chain(50, 99);
    let target = Expression::role("p0", "r");

    let multiplied = search(&store, &target);
    assert_eq!(multiplied.values().next().unwrap().weight, 49);

    let options = SearchOptions {
        weight_rule: WeightRule::Minimum,
        ..SearchOptions::default()
    };
    let minimum = Resolver::with_options(&store, options).search(&target);
    assert_eq!(minimum.values().next().unwrap().weight, 99);

    // Decays to the floor of 1 but the member stays reachable.
    let weak = inclusion_chain(50, 90);
    let solutions = search(&weak, &target);
    assert_eq!(solutions.len(), 1);
    let solution = solutions.values().next().unwrap();
    assert_eq!(solution.member, Principal::new("m"));
    assert_eq!(solution.weight, 1);
    assert!(prove(&LocalVerifier::new(&weak), solution).is_ok());
}

#[test]
fn stress_low_weight_hops_keep_member() {
    // a.r ← b.r (10), b.r ← m (9): 10 * 9 / 100 rounds to 0 without the floor.
    let mut store = MemoryStore::new();
    let r = RoleName::new("r");
    let a = Principal::new("a");
    let b = Principal::new("b");
    store.declare_role(&a, &r);
    store.declare_role(&b, &r);
    store.issue(&a, &r, Expression::role("b", "r"), 10).unwrap();
    store.issue(&b, &r, Expression::member("m"), 9).unwrap();

    assert_eq!(search(&store, &Expression::role("b", "r")).len(), 1);
    let solutions = search(&store, &Expression::role("a", "r"));
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions.values().next().unwrap().weight, 1);
}

#[test]
fn stress_inclusion_chain_depth_20000() {
    let depth = 20_000;
    let store = inclusion_chain(depth, 100);
    let report = Resolver::new(&store).search_with_report(&Expression::role("p0", "r"));
    assert_eq!(report.solutions.len(), 1);
    assert_eq!(report.stats.depth_cut, 0);

    let solution = report.solutions.values().next().unwrap();
    assert_eq!(solution.member, Principal::new("m"));
    assert_eq!(solution.path.len(), depth + 1);
    assert_eq!(solution.req_stack_size, 1);

    let proof = encode_proof(solution);
    let verified = LocalVerifier::new(&store)
        .verify_proof(&proof.steps, proof.req_stack_size)
        .expect("deep chain should verify");
    assert_eq!(verified.principal, Principal::new("p0"));
}

/// org0.member ← org0.sub.member, org0.sub ← org1, ..., org{levels}.member ← m
fn nested_organisations(levels: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    let member = RoleName::new("member");
    let sub = RoleName::new("sub");
    for i in 0..=levels {
        let org = Principal::new(format!("org{i}"));
        store.declare_role(&org, &member);
        store.declare_role(&org, &sub);
    }
    for i in 0..levels {
        let org = Principal::new(format!("org{i}"));
        store
            .issue(&org, &member, Expression::linked(format!("org{i}"), "sub", "member"), 100)
            .unwrap();
        store
            .issue(&org, &sub, Expression::member(format!("org{}", i + 1)), 100)
            .unwrap();
    }
    store
        .issue(&Principal::new(format!("org{levels}")), &member, Expression::member("m"), 100)
        .unwrap();
    store
}

#[test]
fn stress_nested_linked_roles_depth_20() {
    let store = nested_organisations(20);
    let solutions = search(&store, &Expression::role("org0", "member"));
    assert_eq!(solutions.len(), 1);

    let solution = solutions.values().next().unwrap();
    // three edges per level plus the leaf credential
    assert_eq!(solution.path.len(), 3 * 20 + 1);
    assert_eq!(solution.req_stack_size, 2);

    let proof = encode_proof(solution);
    assert_eq!(proof.steps.len(), 2 * 20 + 1);

    let verifier = LocalVerifier::new(&store);
    let verified = verifier
        .verify_proof(&proof.steps, proof.req_stack_size)
        .expect("nested proof should verify");
    assert_eq!(verified.member, Principal::new("m"));

    assert!(verifier
        .verify_proof(&proof.steps, proof.req_stack_size - 1)
        .is_err());
}

#[test]
fn stress_depth_bound_cuts_long_chain() {
    let store = inclusion_chain(50, 100);
    let options = SearchOptions {
        max_depth: Some(25),
        ..SearchOptions::default()
    };
    let report = Resolver::with_options(&store, options)
        .search_with_report(&Expression::role("p0", "r"));
    assert!(report.solutions.is_empty());
    assert_eq!(report.stats.depth_cut, 1);
}
