//! Stress test: the EPapers policy at growing populations.

use std::time::Instant;

use dart_rt::scenario;
use dart_rt::{prove, LocalVerifier, Resolver};

fn run(eligibles: usize, universities: usize) {
    let policy = scenario::build(eligibles, universities).expect("policy should build");

    let start = Instant::now();
    let report = Resolver::new(&policy.store).search_with_report(&policy.target);
    let search_time = start.elapsed();

    assert_eq!(report.solutions.len(), eligibles);
    assert_eq!(report.stats.cycles_cut, 0);

    let verifier = LocalVerifier::new(&policy.store);
    let start = Instant::now();
    for solution in report.solutions.values() {
        let (proof, _) = prove(&verifier, solution).expect("proof should verify");
        // Proof size does not depend on the population.
        assert_eq!(proof.identifier_count(), 16);
        assert_eq!(proof.req_stack_size, 3);
    }
    let verify_time = start.elapsed();

    eprintln!(
        "{eligibles} eligibles / {universities} universities: search {:?}, verify {:?} ({} nodes, {} edges)",
        search_time, verify_time, report.stats.nodes, report.stats.edges
    );
}

#[test]
fn stress_scenario_100_eligibles_10_universities() {
    run(100, 10);
}

#[test]
fn stress_scenario_500_eligibles_25_universities() {
    run(500, 25);
}

#[test]
fn stress_scenario_single_university_crowd() {
    run(300, 1);
}
