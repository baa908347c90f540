//! Ledger file persistence.
//!
//! File format:
//! ```json
//! {
//!   "version": 1,
//!   "roles": [ { "principal": "...", "role": "..." } ],
//!   "records": [ { "credential": { ... }, "issued_at": 0, "signature": null } ]
//! }
//! ```
//!
//! Loading never trusts the file: every role is re-declared and every record
//! is re-issued (signed records are re-submitted) through the store, so the
//! same validation applies as for live issuance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::error::{DartError, Result};
use crate::principal::{Principal, RoleName};
use crate::store::{CredentialRecord, MemoryStore};

/// Current ledger file format version.
pub const LEDGER_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RoleEntry {
    principal: Principal,
    role: RoleName,
}

/// Wrapper written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    /// Format version number.
    version: u32,
    /// Declared roles in declaration order.
    roles: Vec<RoleEntry>,
    /// Credential log in issue order.
    records: Vec<CredentialRecord>,
}

/// Write a snapshot of `store` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns `DartError::SerializationError` if serialization fails, or
/// `DartError::Io` for filesystem errors.
pub fn save_ledger(path: &Path, store: &MemoryStore) -> Result<()> {
    let file = LedgerFile {
        version: LEDGER_FILE_VERSION,
        roles: store
            .roles()
            .iter()
            .map(|(principal, role)| RoleEntry {
                principal: principal.clone(),
                role: role.clone(),
            })
            .collect(),
        records: store.records().to_vec(),
    };

    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| DartError::SerializationError(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, json.as_bytes())?;
    log::debug!(
        "saved ledger {} ({} roles, {} credentials)",
        path.display(),
        file.roles.len(),
        file.records.len()
    );
    Ok(())
}

/// Load a ledger file, replaying it into a fresh store.
///
/// # Errors
///
/// Returns `DartError::NotFound` if the file does not exist,
/// `DartError::InvalidFileFormat` for malformed JSON or an unknown version,
/// any issuance error raised while replaying records, or `DartError::Io`.
pub fn load_ledger(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        return Err(DartError::NotFound(format!(
            "ledger file not found: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)?;
    let file: LedgerFile = serde_json::from_slice(&bytes).map_err(|e| {
        DartError::InvalidFileFormat(format!(
            "failed to parse ledger file {}: {e}",
            path.display()
        ))
    })?;

    if file.version != LEDGER_FILE_VERSION {
        return Err(DartError::InvalidFileFormat(format!(
            "unsupported ledger version {} (expected {LEDGER_FILE_VERSION})",
            file.version
        )));
    }

    let mut store = MemoryStore::new();
    for entry in &file.roles {
        store.declare_role(&entry.principal, &entry.role);
    }

    for record in &file.records {
        let replayed = match record.to_signed() {
            Some(signed) => store.submit(&signed)?,
            None => {
                let c = &record.credential;
                let rebuilt = Credential::new(
                    c.issuer.clone(),
                    c.role.clone(),
                    c.source.clone(),
                    c.weight as u32,
                )?;
                store.append(rebuilt, record.issued_at, None)?
            }
        };
        if replayed != record.credential.id {
            return Err(DartError::InvalidFileFormat(format!(
                "credential id {} does not match its contents",
                record.credential.id
            )));
        }
    }

    log::debug!(
        "loaded ledger {} ({} roles, {} credentials)",
        path.display(),
        store.roles().len(),
        store.len()
    );
    Ok(store)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
