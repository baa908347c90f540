//! DART-RT — Decentralized role-based trust resolution.
//!
//! Principals declare roles and issue weighted credentials that include
//! other principals, other roles, linked roles (`p.A.B`) or intersections
//! of roles into them. Given a target role, the resolver searches the
//! credential web backwards for every member, and each result carries a
//! derivation path that encodes into a compact proof a bounded stack
//! machine can verify independently.

pub mod credential;
pub mod crypto;
pub mod error;
pub mod expression;
pub mod graph;
pub mod principal;
pub mod proof;
pub mod resolver;
pub mod scenario;
pub mod storage;
pub mod store;
pub mod time;
pub mod verify;

// Re-export primary types
pub use error::{DartError, Result};
pub use expression::{Expression, ExpressionId, ExpressionKind};
pub use principal::{Principal, PrincipalKey, RoleName};

// Re-export credential types
pub use credential::{
    Credential, CredentialBuilder, CredentialId, RoleId, SignedCredential, MAX_WEIGHT,
};
pub use store::{CredentialRecord, CredentialStore, MemoryStore};

// Re-export search and proof types
pub use proof::{encode_proof, Proof, ProofStep};
pub use resolver::{
    accept, search, PathEdge, Resolver, SearchOptions, SearchReport, SearchStats, Solution,
    SolutionId, WeightRule,
};
pub use verify::{confirm, prove, prove_all, LocalVerifier, VerifiedMembership, Verifier};
