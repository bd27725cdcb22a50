use tessera_core::{AliasId, OutputId};

/// Ledger-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("wrong network: expected {expected}, got {actual}")]
    WrongNetwork { expected: String, actual: String },

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("transaction signature is invalid")]
    InvalidSignature,

    #[error("input not found or already spent: {0}")]
    InputNotFound(OutputId),

    #[error("input {0} is timelocked")]
    InputLocked(OutputId),

    #[error("signer cannot unlock input {0}")]
    UnlockFailed(OutputId),

    #[error("amount mismatch: inputs {inputs}, outputs {outputs}")]
    AmountMismatch { inputs: u64, outputs: u64 },

    #[error("insufficient storage deposit: required {required}, got {actual}")]
    InsufficientStorageDeposit { required: u64, actual: u64 },

    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("storage deposit return not fulfilled: {0}")]
    StorageDepositReturn(String),

    #[error("invalid alias transition: {0}")]
    AliasTransition(String),

    #[error("alias not found: {0}")]
    AliasNotFound(AliasId),

    #[error("output not found: {0}")]
    OutputNotFound(OutputId),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("node returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("core error: {0}")]
    Core(#[from] tessera_core::CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
