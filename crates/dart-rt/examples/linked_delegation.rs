//! Linked Delegation — delegate a role to the members of another role,
//! search it, and verify the resulting proofs.
//!
//! Run with:
//!   cargo run --example linked_delegation -p dart-rt

use dart_rt::{
    prove, CredentialBuilder, Expression, LocalVerifier, MemoryStore, Principal, PrincipalKey,
    Resolver, RoleName,
};

fn main() {
    // ── Setup: a registry with a signing key, a hospital, two clinics ───────
    let registry_key = PrincipalKey::generate();
    let registry = registry_key.principal();
    let hospital = Principal::new("hospital");
    let clinic_a = Principal::new("clinic_a");
    let clinic_b = Principal::new("clinic_b");

    let accredited = RoleName::new("accredited");
    let staff = RoleName::new("staff");
    let records = RoleName::new("records");

    println!("Principals:");
    println!("  Registry: {registry}");
    println!("  Hospital: {hospital}");
    println!();

    let mut store = MemoryStore::new();
    store.declare_role(&registry, &accredited);
    store.declare_role(&hospital, &records);
    store.declare_role(&clinic_a, &staff);
    store.declare_role(&clinic_b, &staff);

    // ── 1. The registry accredits both clinics (signed) ─────────────────────
    for clinic in [&clinic_a, &clinic_b] {
        let signed = CredentialBuilder::new(accredited.clone(), Expression::member(clinic.as_str()))
            .sign(&registry_key)
            .expect("signing should succeed");
        let id = store.submit(&signed).expect("signed credential accepted");
        println!("Accredited {clinic}: {id}");
    }

    // ── 2. Clinics list their staff ─────────────────────────────────────────
    store
        .issue(&clinic_a, &staff, Expression::member("dr_ana"), 100)
        .expect("issue should succeed");
    store
        .issue(&clinic_b, &staff, Expression::member("dr_ben"), 80)
        .expect("issue should succeed");

    // ── 3. hospital.records ←- registry.accredited.staff ────────────────────
    //
    // The hospital does not know any doctor. It trusts whoever the clinics
    // the registry accredits call their staff.
    let source = Expression::linked(registry.as_str(), accredited.as_str(), staff.as_str());
    store
        .issue(&hospital, &records, source.clone(), 90)
        .expect("issue should succeed");
    println!("Delegation: {hospital}.{records} ←- {source} (90)");
    println!();

    // ── 4. Search and prove ─────────────────────────────────────────────────
    let target = Expression::of_role(&hospital, &records);
    let report = Resolver::new(&store).search_with_report(&target);
    println!(
        "Search {target}: {} solutions ({} nodes, {} edges)",
        report.solutions.len(),
        report.stats.nodes,
        report.stats.edges
    );

    let verifier = LocalVerifier::new(&store);
    for solution in report.solutions.values() {
        let (proof, verified) = prove(&verifier, solution).expect("proof should verify");
        println!("  {} (weight {})", solution.member, solution.weight);
        for edge in &solution.path {
            println!("    {edge}");
        }
        println!(
            "    proof: {} identifiers, stack {}; verified {verified}",
            proof.identifier_count(),
            proof.req_stack_size
        );
    }
}
