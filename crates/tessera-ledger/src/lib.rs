//! Tessera Ledger — a minimal UTXO ledger with alias outputs.
//!
//! Alias outputs carry DID documents in their state metadata; basic outputs
//! carry tokens. Every output must hold at least the storage deposit its
//! byte size demands, which is why identities request faucet funds before
//! publishing.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod output;
pub mod state;
pub mod transaction;

pub use client::{tokens_available, LedgerClient};
pub use error::LedgerError;
pub use http::HttpLedgerClient;
pub use memory::{unix_now, MemoryLedger};
pub use output::{
    compute_storage_deposit, AliasOutput, BasicOutput, Expiration, Output, OutputFilter,
    ProtocolParameters, RentStructure, StorageDepositReturn,
};
pub use state::{AppliedTransaction, LedgerState};
pub use transaction::{Transaction, TransactionBuilder, TransactionEssence};
