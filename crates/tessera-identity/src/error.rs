use tessera_core::CoreError;
use tessera_crypto::CryptoError;
use tessera_ledger::LedgerError;

use crate::validator::{CompoundCredentialValidationError, ValidationError};

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("DID {0} has been deactivated")]
    Deactivated(String),

    #[error("network mismatch: expected {expected}, got {actual}")]
    NetworkMismatch { expected: String, actual: String },

    #[error("verification method not found: {0}")]
    MethodNotFound(String),

    #[error("fragment already in use: {0}")]
    DuplicateFragment(String),

    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("key not found in storage: {0}")]
    KeyNotFound(String),

    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("revocation bitmap error: {0}")]
    Revocation(String),

    #[error("credential validation failed: {0}")]
    CredentialValidation(#[from] CompoundCredentialValidationError),

    #[error("presentation validation failed: {0}")]
    PresentationValidation(#[from] ValidationError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for IdentityError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
