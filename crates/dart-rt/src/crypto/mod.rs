//! Cryptographic primitives for DART-RT.
//!
//! This module provides:
//! - Ed25519 key generation for principals
//! - Issuance signatures over credential ids

pub mod keys;
pub mod signing;
