//! Storage layer for store snapshots.
//!
//! A ledger file captures every declared role and every credential record
//! of a [`crate::store::MemoryStore`], so the CLI can keep a policy between
//! invocations.
//!
//! # Modules
//!
//! - [`ledger_file`] — JSON save/load of a full store snapshot.

pub mod ledger_file;

pub use ledger_file::{load_ledger, save_ledger, LEDGER_FILE_VERSION};
