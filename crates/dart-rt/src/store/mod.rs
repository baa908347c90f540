//! Credential stores — the ground truth the resolver and verifier read.
//!
//! The resolver never touches a concrete store: it receives a
//! [`CredentialStore`] capability for the duration of one search. Any
//! append-only source of credentials (a ledger client, a test fixture, the
//! in-memory [`MemoryStore`]) can stand behind the trait.

pub mod memory;

use crate::credential::Credential;
use crate::expression::{Expression, ExpressionId};
use crate::principal::{Principal, RoleName};

pub use memory::{CredentialRecord, IssuerSignature, MemoryStore};

/// Read-only view of a credential store at one point in time.
pub trait CredentialStore {
    /// Has `principal` declared `role`?
    fn is_role_declared(&self, principal: &Principal, role: &RoleName) -> bool;

    /// Every credential whose destination is `principal.role`, in issue order.
    fn credentials_for(&self, principal: &Principal, role: &RoleName) -> Vec<&Credential>;

    /// The credential in force between `source` and `destination`: the
    /// latest one issued for that pair. A weight of 0 means revoked.
    fn find_credential(
        &self,
        destination: &ExpressionId,
        source: &ExpressionId,
    ) -> Option<&Credential>;

    /// Resolve an expression id seen in a declared role or credential source.
    fn expression(&self, id: &ExpressionId) -> Option<&Expression>;
}
