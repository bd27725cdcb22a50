//! Tessera Core — identifiers shared by the ledger, identity and credential
//! layers of the Tessera decentralized identity proof of concept.

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{COIN_TYPE_IOTA, COIN_TYPE_SHIMMER, DEFAULT_NETWORK_HRP, DID_METHOD};
pub use error::CoreError;
pub use types::{Address, AliasId, Did, DidUrl, OutputId, TransactionId};
