//! In-memory, append-only credential store.
//!
//! Records are held in an append-only log with three secondary indexes:
//!
//! - role → credentials whose destination is that role (issue order),
//! - (destination id, source id) → credentials linking that pair,
//! - credential id → latest log position.
//!
//! For a (destination, source) pair the latest credential in issue order is
//! the one in force; a later weight-0 credential revokes the pair.
//!
//! `Clone` produces an independent point-in-time snapshot, which is what
//! concurrent searches and verifications read from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::credential::{Credential, CredentialId, RoleId, SignedCredential};
use crate::error::{DartError, Result};
use crate::expression::{Expression, ExpressionId};
use crate::principal::{Principal, RoleName};

use super::CredentialStore;

/// Issuer signature carried alongside a submitted credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerSignature {
    /// Issuer's public key (base64).
    pub issuer_key: String,
    /// Signature over the credential id and timestamp (base64).
    pub signature: String,
}

/// One entry in the store's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub credential: Credential,
    /// Issue timestamp (microseconds since epoch).
    pub issued_at: u64,
    /// Present when the credential was submitted signed.
    pub signature: Option<IssuerSignature>,
}

impl CredentialRecord {
    /// Reassemble the signed form, for records that have one.
    pub fn to_signed(&self) -> Option<SignedCredential> {
        self.signature.as_ref().map(|sig| SignedCredential {
            credential: self.credential.clone(),
            issuer_key: sig.issuer_key.clone(),
            issued_at: self.issued_at,
            signature: sig.signature.clone(),
        })
    }
}

type RoleKey = (Principal, RoleName);

/// Append-only in-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Declared roles in declaration order.
    roles: Vec<RoleKey>,
    /// Role → its identifier.
    declared: HashMap<RoleKey, RoleId>,
    /// Append-only credential log.
    records: Vec<CredentialRecord>,
    /// Secondary index: credential id → log position.
    by_id: HashMap<CredentialId, usize>,
    /// Secondary index: destination role → log positions.
    by_role: HashMap<RoleKey, Vec<usize>>,
    /// Secondary index: (destination id, source id) → log positions.
    by_link: HashMap<(ExpressionId, ExpressionId), Vec<usize>>,
    /// Every expression seen as a declared role or credential source.
    expressions: HashMap<ExpressionId, Expression>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `principal.role`, making it a valid credential destination.
    ///
    /// Declaring an existing role is a no-op returning the same id.
    pub fn declare_role(&mut self, principal: &Principal, role: &RoleName) -> RoleId {
        let key = (principal.clone(), role.clone());
        if let Some(id) = self.declared.get(&key) {
            return id.clone();
        }

        let id = RoleId::for_role(principal, role);
        let expr = Expression::of_role(principal, role);
        self.expressions.insert(expr.id(), expr);
        self.declared.insert(key.clone(), id.clone());
        self.roles.push(key);
        log::debug!("declared role {principal}.{role} as {id}");
        id
    }

    /// Issue `issuer.role ← source` at `weight` (0..=100).
    ///
    /// Issuing a credential identical to an existing one returns the
    /// existing id and leaves the log unchanged.
    ///
    /// # Errors
    ///
    /// `UnknownRole` if `issuer` has not declared `role`, `InvalidWeight`
    /// if `weight` exceeds 100.
    pub fn issue(
        &mut self,
        issuer: &Principal,
        role: &RoleName,
        source: Expression,
        weight: u32,
    ) -> Result<CredentialId> {
        let credential = Credential::new(issuer.clone(), role.clone(), source, weight)?;
        self.append(credential, crate::time::now_micros(), None)
    }

    /// Append a credential signed by its issuer.
    ///
    /// # Errors
    ///
    /// Signature and issuer-binding failures from
    /// [`SignedCredential::verify_signature`], then the same checks as
    /// [`MemoryStore::issue`].
    pub fn submit(&mut self, signed: &SignedCredential) -> Result<CredentialId> {
        if let Err(e) = signed.verify_signature() {
            log::warn!("rejected signed credential {}: {e}", signed.credential.id);
            return Err(e);
        }
        let signature = IssuerSignature {
            issuer_key: signed.issuer_key.clone(),
            signature: signed.signature.clone(),
        };
        self.append(signed.credential.clone(), signed.issued_at, Some(signature))
    }

    /// Append with an explicit timestamp; used when replaying a ledger.
    pub(crate) fn append(
        &mut self,
        credential: Credential,
        issued_at: u64,
        signature: Option<IssuerSignature>,
    ) -> Result<CredentialId> {
        let key = (credential.issuer.clone(), credential.role.clone());
        if !self.declared.contains_key(&key) {
            return Err(DartError::UnknownRole {
                principal: credential.issuer.to_string(),
                role: credential.role.to_string(),
            });
        }

        let destination_id = credential.destination_id();
        let source_id = credential.source.id();
        let pair = (destination_id, source_id);

        // Re-issuing is a no-op only while this credential is still the
        // latest for its pair; after a newer one it reinstates it.
        if self.by_id.contains_key(&credential.id) {
            let current = self
                .by_link
                .get(&pair)
                .and_then(|positions| positions.last())
                .map(|&i| &self.records[i].credential.id);
            if current == Some(&credential.id) {
                log::debug!("credential {} already issued; not appended", credential.id);
                return Ok(credential.id);
            }
        }

        let position = self.records.len();
        let id = credential.id.clone();
        let source_id = pair.1.clone();

        self.expressions
            .entry(source_id.clone())
            .or_insert_with(|| credential.source.clone());
        self.by_id.insert(id.clone(), position);
        self.by_role.entry(key).or_default().push(position);
        self.by_link.entry(pair).or_default().push(position);

        log::debug!("issued {id}: {credential}");
        self.records.push(CredentialRecord {
            credential,
            issued_at,
            signature,
        });
        Ok(id)
    }

    /// Look up a credential by id.
    pub fn credential(&self, id: &CredentialId) -> Option<&Credential> {
        self.by_id.get(id).map(|&i| &self.records[i].credential)
    }

    /// The full log in issue order.
    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    /// Declared roles in declaration order.
    pub fn roles(&self) -> &[(Principal, RoleName)] {
        &self.roles
    }

    /// Number of credentials in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CredentialStore for MemoryStore {
    fn is_role_declared(&self, principal: &Principal, role: &RoleName) -> bool {
        self.declared
            .contains_key(&(principal.clone(), role.clone()))
    }

    fn credentials_for(&self, principal: &Principal, role: &RoleName) -> Vec<&Credential> {
        self.by_role
            .get(&(principal.clone(), role.clone()))
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| &self.records[i].credential)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_credential(
        &self,
        destination: &ExpressionId,
        source: &ExpressionId,
    ) -> Option<&Credential> {
        self.by_link
            .get(&(destination.clone(), source.clone()))?
            .iter()
            .last()
            .map(|&i| &self.records[i].credential)
    }

    fn expression(&self, id: &ExpressionId) -> Option<&Expression> {
        self.expressions.get(id)
    }
}
