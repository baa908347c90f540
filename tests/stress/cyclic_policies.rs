//! Stress test: cyclic credential webs must terminate and stay sound.

use dart_rt::{prove, Expression, LocalVerifier, MemoryStore, Principal, Resolver, RoleName};

fn ring(size: usize, exit_at: Option<usize>) -> MemoryStore {
    let mut store = MemoryStore::new();
    let r = RoleName::new("r");
    for i in 0..size {
        store.declare_role(&Principal::new(format!("p{i}")), &r);
    }
    for i in 0..size {
        let next = format!("p{}", (i + 1) % size);
        store
            .issue(&Principal::new(format!("p{i}")), &r, Expression::role(next, "r"), 100)
            .expect("issue should succeed");
    }
    if let Some(i) = exit_at {
        store
            .issue(&Principal::new(format!("p{i}")), &r, Expression::member("m"), 100)
            .expect("issue should succeed");
    }
    store
}

#[test]
fn stress_mutual_inclusion_is_empty() {
    let store = ring(2, None);
    let report = Resolver::new(&store).search_with_report(&Expression::role("p0", "r"));
    assert!(report.solutions.is_empty());
    assert!(report.stats.cycles_cut >= 1);
}

#[test]
fn stress_ring_of_200_terminates() {
    let store = ring(200, None);
    let report = Resolver::new(&store).search_with_report(&Expression::role("p0", "r"));
    assert!(report.solutions.is_empty());
    assert_eq!(report.stats.cycles_cut, 1);
    assert_eq!(report.stats.nodes, 200);
}

#[test]
fn stress_ring_with_exit_has_single_cycle_free_path() {
    let store = ring(100, Some(50));
    let solutions = Resolver::new(&store).search(&Expression::role("p0", "r"));
    assert_eq!(solutions.len(), 1);

    let solution = solutions.values().next().unwrap();
    // p0 → ... → p50, then the member leaf
    assert_eq!(solution.path.len(), 51);

    let mut seen = std::collections::HashSet::new();
    for edge in &solution.path {
        assert!(seen.insert(edge.to_id.clone()), "path revisits {}", edge.to);
    }

    prove(&LocalVerifier::new(&store), solution).expect("cycle-free path should prove");
}

#[test]
fn stress_dense_cycles_terminate() {
    // Every role includes every other role.
    let n = 12;
    let mut store = MemoryStore::new();
    let r = RoleName::new("r");
    for i in 0..n {
        store.declare_role(&Principal::new(format!("p{i}")), &r);
    }
    for i in 0..n {
        for j in 0..n {
            if i != j {
                store
                    .issue(
                        &Principal::new(format!("p{i}")),
                        &r,
                        Expression::role(format!("p{j}"), "r"),
                        100,
                    )
                    .unwrap();
            }
        }
    }
    store
        .issue(&Principal::new("p0"), &r, Expression::member("m"), 100)
        .unwrap();

    let options = dart_rt::SearchOptions {
        max_depth: Some(4),
        ..Default::default()
    };
    let report =
        Resolver::with_options(&store, options).search_with_report(&Expression::role("p3", "r"));
    // p3 → p0 → m at every length up to the depth bound
    assert_eq!(report.solutions.len(), 1 + 10 + 90);
    assert!(report.stats.depth_cut > 0);
    assert!(report
        .solutions
        .values()
        .all(|s| s.member == Principal::new("m")));
}

#[test]
fn stress_self_linked_role_terminates() {
    // p.r ← p.r.r: members of p.r delegate their own r. Expanding the
    // linked head re-enters p.r on the same branch, so only direct members
    // are found.
    let mut store = MemoryStore::new();
    let p = Principal::new("p");
    let q = Principal::new("q");
    let r = RoleName::new("r");
    store.declare_role(&p, &r);
    store.declare_role(&q, &r);
    store.issue(&p, &r, Expression::linked("p", "r", "r"), 100).unwrap();
    store.issue(&p, &r, Expression::member("q"), 100).unwrap();
    store.issue(&q, &r, Expression::member("m"), 100).unwrap();

    let solutions = Resolver::new(&store).search(&Expression::role("p", "r"));
    let mut members: Vec<String> = solutions.values().map(|s| s.member.to_string()).collect();
    members.sort();
    members.dedup();
    assert_eq!(members, vec!["q"]);

    let verifier = LocalVerifier::new(&store);
    for solution in solutions.values() {
        prove(&verifier, solution).expect("proof should verify");
    }
}
