/// Credential flow errors.
///
/// Builder validation messages are kept short and user facing; the demo
/// prints them as is.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Client must be set.")]
    MissingClient,

    #[error("Subject must be set.")]
    MissingSubject,

    #[error("Nonce must be set.")]
    MissingNonce,

    #[error("Verification method must be set.")]
    MissingVerificationMethod,

    #[error("At least one credential must be added.")]
    NoCredentials,

    #[error("No request to validate.")]
    NoRequest,

    #[error("No response to validate.")]
    NoResponse,

    #[error("Output not updated.")]
    OutputNotUpdated,

    #[error("faucet did not fund {address} after {attempts} attempts")]
    FaucetTimeout { address: String, attempts: u32 },

    #[error("identity error: {0}")]
    Identity(#[from] tessera_identity::IdentityError),

    #[error("ledger error: {0}")]
    Ledger(#[from] tessera_ledger::LedgerError),

    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),

    #[error("core error: {0}")]
    Core(#[from] tessera_core::CoreError),
}
