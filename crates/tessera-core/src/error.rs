/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("invalid DID URL: {0}")]
    InvalidDidUrl(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid network name: {0}")]
    InvalidNetwork(String),
}
