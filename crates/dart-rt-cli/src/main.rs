//! DART-RT CLI — `dart` command.
//!
//! Declares roles, issues credentials into a local ledger file, searches
//! role memberships and proves them with the local verifier.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use dart_rt::scenario;
use dart_rt::storage::{load_ledger, save_ledger};
use dart_rt::time::micros_to_rfc3339;
use dart_rt::{
    accept, prove, prove_all, CredentialStore, Expression, ExpressionId, LocalVerifier,
    MemoryStore, Principal, Proof, Resolver, RoleName, SearchOptions, Solution, Verifier,
    WeightRule,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_ledger_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --ledger")?;
    Ok(PathBuf::from(home).join(".dart").join("ledger.json"))
}

fn open_ledger(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        return Ok(MemoryStore::new());
    }
    load_ledger(path).with_context(|| format!("failed to load ledger {}", path.display()))
}

fn parse_role(s: &str) -> Result<(Principal, RoleName)> {
    let expr: Expression = s.parse().with_context(|| format!("invalid role '{s}'"))?;
    match expr.as_role() {
        Some((principal, role)) => Ok((principal.clone(), role.clone())),
        None => Err(anyhow!("'{s}' is not a role (expected principal.role)")),
    }
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// DART-RT CLI — decentralized role-based trust resolution.
#[derive(Parser, Debug)]
#[command(
    name = "dart",
    about = "DART-RT CLI",
    version,
    long_about = "dart — DART-RT CLI\n\nDeclare roles, issue weighted credentials, search role memberships\nand verify the resulting proofs."
)]
struct Cli {
    /// Ledger file (default: $HOME/.dart/ledger.json)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage declared roles
    Role {
        #[command(subcommand)]
        subcommand: RoleCommands,
    },

    /// Issue a credential: ISSUER.ROLE ←- SOURCE
    Issue {
        /// Issuing principal
        issuer: String,

        /// Role name owned by the issuer
        role: String,

        /// Source expression: `member`, `p.role`, `p.roleA.roleB` or `p.a & q.b`
        source: String,

        /// Trust weight (0-100)
        #[arg(long, default_value_t = 100)]
        weight: u32,
    },

    /// List issued credentials
    Credentials {
        /// Only credentials for this role (principal.role)
        #[arg(long)]
        role: Option<String>,
    },

    /// Find every member of a target expression
    Search {
        /// Target expression, e.g. `epapers.canAccess`
        target: String,

        /// Only show solutions with at least this weight
        #[arg(long, default_value_t = 0)]
        min_weight: u8,

        /// Weight composition rule (multiplicative, minimum)
        #[arg(long, default_value = "multiplicative")]
        rule: String,

        /// Print solutions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a target, then encode and verify a proof for every solution
    Prove {
        /// Target role, e.g. `epapers.canAccess`
        target: String,

        /// Print each proof as a flat identifier list (JSON)
        #[arg(long)]
        json: bool,
    },

    /// Verify a flat proof (`to from to from ...`) against the ledger
    Verify {
        /// Stack size the proof was encoded with
        #[arg(long)]
        stack: usize,

        /// Expression identifiers, leaf first
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Run the EPapers policy in memory and prove every solution
    Scenario {
        /// Number of eligible principals
        eligibles: usize,

        /// Number of universities
        universities: usize,
    },
}

#[derive(Subcommand, Debug)]
enum RoleCommands {
    /// Declare PRINCIPAL.ROLE
    Declare {
        /// Owning principal
        principal: String,

        /// Role name
        role: String,
    },

    /// List declared roles
    List,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let verbose = cli.verbose;
    let ledger = match cli.ledger {
        Some(path) => path,
        None => default_ledger_path()?,
    };

    match cli.command {
        Commands::Role { subcommand } => match subcommand {
            RoleCommands::Declare { principal, role } => {
                cmd_role_declare(&ledger, &principal, &role, verbose)
            }
            RoleCommands::List => cmd_role_list(&ledger, verbose),
        },
        Commands::Issue {
            issuer,
            role,
            source,
            weight,
        } => cmd_issue(&ledger, &issuer, &role, &source, weight, verbose),
        Commands::Credentials { role } => cmd_credentials(&ledger, role.as_deref(), verbose),
        Commands::Search {
            target,
            min_weight,
            rule,
            json,
        } => cmd_search(&ledger, &target, min_weight, &rule, json, verbose),
        Commands::Prove { target, json } => cmd_prove(&ledger, &target, json, verbose),
        Commands::Verify { stack, ids } => cmd_verify(&ledger, stack, &ids),
        Commands::Scenario {
            eligibles,
            universities,
        } => cmd_scenario(eligibles, universities, verbose),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `dart role declare PRINCIPAL ROLE`
fn cmd_role_declare(ledger: &Path, principal: &str, role: &str, verbose: bool) -> Result<()> {
    let principal = Principal::parse(principal).context("invalid principal")?;
    let role = RoleName::parse(role).context("invalid role name")?;

    let mut store = open_ledger(ledger)?;
    let id = store.declare_role(&principal, &role);
    save_ledger(ledger, &store).context("failed to save ledger")?;

    println!("Role declared");
    println!("  Role ID:   {id}");
    println!("  Role:      {principal}.{role}");
    if verbose {
        println!("  Ledger:    {}", ledger.display());
    }
    Ok(())
}

/// `dart role list`
fn cmd_role_list(ledger: &Path, verbose: bool) -> Result<()> {
    let store = open_ledger(ledger)?;
    let roles = store.roles();

    println!("Roles ({}):", roles.len());
    if roles.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for (principal, role) in roles {
        if verbose {
            let count = store.credentials_for(principal, role).len();
            println!("  {principal}.{role} ({count} credentials)");
        } else {
            println!("  {principal}.{role}");
        }
    }
    Ok(())
}

/// `dart issue ISSUER ROLE SOURCE [--weight N]`
fn cmd_issue(
    ledger: &Path,
    issuer: &str,
    role: &str,
    source: &str,
    weight: u32,
    verbose: bool,
) -> Result<()> {
    let issuer = Principal::parse(issuer).context("invalid issuer")?;
    let role = RoleName::parse(role).context("invalid role name")?;
    let source: Expression = source
        .parse()
        .with_context(|| format!("invalid source expression '{source}'"))?;

    let mut store = open_ledger(ledger)?;
    let id = store
        .issue(&issuer, &role, source.clone(), weight)
        .context("failed to issue credential")?;
    save_ledger(ledger, &store).context("failed to save ledger")?;

    println!("Credential issued");
    println!("  Credential ID: {id}");
    println!("  Statement:     {issuer}.{role} ←- {source}");
    println!("  Weight:        {weight}");
    if verbose {
        println!("  Source ID:     {}", source.id());
    }
    Ok(())
}

/// `dart credentials [--role P.R]`
fn cmd_credentials(ledger: &Path, role: Option<&str>, verbose: bool) -> Result<()> {
    let store = open_ledger(ledger)?;
    let filter = role.map(parse_role).transpose()?;
    if let Some((principal, role)) = &filter {
        if !store.is_role_declared(principal, role) {
            return Err(anyhow!("role {principal}.{role} has not been declared"));
        }
    }

    let records: Vec<_> = store
        .records()
        .iter()
        .filter(|record| match &filter {
            Some((principal, role)) => {
                record.credential.issuer == *principal && record.credential.role == *role
            }
            None => true,
        })
        .collect();

    println!("Credentials ({}):", records.len());
    if records.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    println!("  {:<28} {:>6}  STATEMENT", "CREDENTIAL ID", "WEIGHT");
    println!("  {}", "-".repeat(80));
    for record in records {
        let credential = &record.credential;
        let signed = if record.signature.is_some() {
            " [SIGNED]"
        } else {
            ""
        };
        println!(
            "  {:<28} {:>6}  {}.{} ←- {}{}",
            credential.id,
            credential.weight,
            credential.issuer,
            credential.role,
            credential.source,
            signed
        );
        if verbose {
            println!("    Issued: {}", micros_to_rfc3339(record.issued_at));
        }
    }
    Ok(())
}

/// `dart search TARGET [--min-weight N] [--rule RULE] [--json]`
fn cmd_search(
    ledger: &Path,
    target: &str,
    min_weight: u8,
    rule: &str,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let target: Expression = target
        .parse()
        .with_context(|| format!("invalid target '{target}'"))?;
    let weight_rule: WeightRule = rule.parse()?;
    let store = open_ledger(ledger)?;

    let options = SearchOptions {
        weight_rule,
        ..SearchOptions::default()
    };
    let report = Resolver::with_options(&store, options).search_with_report(&target);
    let accepted = accept(&report.solutions, min_weight);

    if json {
        let out = serde_json::to_string_pretty(&accepted).context("failed to encode solutions")?;
        println!("{out}");
        return Ok(());
    }

    println!("Solutions for {target} ({}):", accepted.len());
    if accepted.is_empty() {
        println!("  (none)");
    }
    for solution in &accepted {
        print_solution(solution, verbose);
    }
    if verbose {
        let stats = &report.stats;
        println!();
        println!("  Nodes:       {}", stats.nodes);
        println!("  Edges:       {}", stats.edges);
        println!("  Cycles cut:  {}", stats.cycles_cut);
        println!("  Depth cut:   {}", stats.depth_cut);
    }
    Ok(())
}

/// `dart prove TARGET [--json]`
fn cmd_prove(ledger: &Path, target: &str, json: bool, verbose: bool) -> Result<()> {
    let target: Expression = target
        .parse()
        .with_context(|| format!("invalid target '{target}'"))?;
    if target.as_role().is_none() {
        return Err(anyhow!("'{target}' is not a role; only role memberships can be proven"));
    }

    let store = open_ledger(ledger)?;
    let solutions = Resolver::new(&store).search(&target);
    if solutions.is_empty() {
        println!("No members found for {target}");
        return Ok(());
    }

    let verifier = LocalVerifier::new(&store);
    if json {
        let mut out = Vec::with_capacity(solutions.len());
        for solution in solutions.values() {
            let (proof, verified) = prove(&verifier, solution)
                .with_context(|| format!("proof for {} failed", solution.member))?;
            out.push(serde_json::json!({
                "member": solution.member,
                "weight": solution.weight,
                "proof": proof.flatten(),
                "req_stack_size": proof.req_stack_size,
                "verified": verified.to_string(),
            }));
        }
        let out = serde_json::to_string_pretty(&out).context("failed to encode proofs")?;
        println!("{out}");
        return Ok(());
    }

    let mut failures = 0;
    for solution in solutions.values() {
        print_solution(solution, verbose);
        match prove(&verifier, solution) {
            Ok((proof, verified)) => {
                println!("    Proof:    {} identifiers", proof.identifier_count());
                println!("    Stack:    {}", proof.req_stack_size);
                println!("    Verified: {verified}");
            }
            Err(e) => {
                failures += 1;
                println!("    FAILED:   {e}");
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{failures} of {} proofs failed", solutions.len()));
    }
    Ok(())
}

/// `dart verify --stack N ID...`
fn cmd_verify(ledger: &Path, stack: usize, ids: &[String]) -> Result<()> {
    let ids: Vec<ExpressionId> = ids.iter().map(|id| ExpressionId(id.clone())).collect();
    let proof = Proof::from_flat(&ids, stack)?;

    let store = open_ledger(ledger)?;
    let verified = LocalVerifier::new(&store).verify_proof(&proof.steps, proof.req_stack_size)?;
    println!("Verified: {verified}");
    println!("  Steps:   {}", proof.steps.len());
    println!("  Stack:   {}", proof.req_stack_size);
    Ok(())
}

/// `dart scenario ELIGIBLES UNIVERSITIES`
fn cmd_scenario(eligibles: usize, universities: usize, verbose: bool) -> Result<()> {
    let policy = scenario::build(eligibles, universities).context("failed to build policy")?;
    let report = Resolver::new(&policy.store).search_with_report(&policy.target);

    println!("EPapers scenario");
    println!("  Eligibles:    {eligibles}");
    println!("  Universities: {universities}");
    println!("  Credentials:  {}", policy.store.len());
    println!("  Solutions:    {}", report.solutions.len());
    println!();

    let verifier = LocalVerifier::new(&policy.store);
    let outcomes = prove_all(&verifier, &report.solutions);

    let mut total_ids = 0;
    let mut failures = 0;
    for (id, outcome) in &outcomes {
        let Some(solution) = report.solutions.get(id) else {
            continue;
        };
        match outcome {
            Ok((proof, verified)) => {
                total_ids += proof.identifier_count();
                println!(
                    "  {:<14} weight {:>3}  proof {:>2} ids  stack {}  {}",
                    solution.member,
                    solution.weight,
                    proof.identifier_count(),
                    proof.req_stack_size,
                    verified
                );
                if verbose {
                    for step in &proof.steps {
                        println!("      {} ←- {}", step.to, step.from);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                println!("  {:<14} FAILED: {e}", solution.member);
            }
        }
    }

    println!();
    println!("  Total proof identifiers: {total_ids}");
    if failures > 0 {
        return Err(anyhow!("{failures} proofs failed"));
    }
    Ok(())
}

fn print_solution(solution: &Solution, verbose: bool) {
    println!(
        "  {:<20} weight {:>3}  ({} edges)",
        solution.member,
        solution.weight,
        solution.path.len()
    );
    if verbose {
        println!("    Solution ID: {}", solution.id);
        for edge in &solution.path {
            println!("    {edge}  [{}]", edge.weight);
        }
    }
}
