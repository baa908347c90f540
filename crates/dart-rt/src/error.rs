//! Error types for DART-RT.
//!
//! All errors are strongly typed and propagated without panicking.
//! Cycle termination and empty solution sets are not errors: the first is
//! reported as a search statistic, the second as an empty result map.

/// Error types covering store, search, proof and verification operations.
#[derive(Debug, thiserror::Error)]
pub enum DartError {
    #[error("Unknown role: {principal}.{role} has not been declared")]
    UnknownRole { principal: String, role: String },

    #[error("Invalid weight {0}: must be within 0..=100")]
    InvalidWeight(u32),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid proof: {reason}")]
    InvalidProof { reason: String },

    #[error("Inconsistent verification: expected {expected}, verifier proved {actual}")]
    InconsistentVerification { expected: String, actual: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Issuer mismatch: credential names {claimed}, signed by {actual}")]
    IssuerMismatch { claimed: String, actual: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DartError {
    pub(crate) fn invalid_proof(reason: impl Into<String>) -> Self {
        Self::InvalidProof {
            reason: reason.into(),
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, DartError>;
