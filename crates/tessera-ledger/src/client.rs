use async_trait::async_trait;
use tessera_core::{Address, AliasId, OutputId, TransactionId};

use crate::error::LedgerError;
use crate::output::{AliasOutput, Output, OutputFilter, RentStructure};
use crate::transaction::Transaction;

/// Access to a ledger node.
///
/// Implemented in process by [`crate::MemoryLedger`] and over HTTP by
/// [`crate::HttpLedgerClient`].
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Human readable prefix of the network's addresses and DIDs.
    async fn network_hrp(&self) -> Result<String, LedgerError>;

    async fn rent_structure(&self) -> Result<RentStructure, LedgerError>;

    /// Ids of unspent basic outputs matching a filter.
    async fn basic_output_ids(&self, filter: &OutputFilter) -> Result<Vec<OutputId>, LedgerError>;

    /// Fetch unspent outputs by id. Fails if any id is unknown.
    async fn get_outputs(&self, ids: &[OutputId]) -> Result<Vec<(OutputId, Output)>, LedgerError>;

    /// The current output of an alias.
    async fn get_alias_output(
        &self,
        alias_id: &AliasId,
    ) -> Result<(OutputId, AliasOutput), LedgerError>;

    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionId, LedgerError>;

    /// Ask the faucet for tokens. Returns the minted output's id.
    async fn request_funds(&self, address: &Address) -> Result<OutputId, LedgerError>;
}

/// Tokens an address can spend with a plain signature.
pub async fn tokens_available(
    client: &dyn LedgerClient,
    address: &Address,
) -> Result<u64, LedgerError> {
    let ids = client
        .basic_output_ids(&OutputFilter::spendable_by(address))
        .await?;
    let outputs = client.get_outputs(&ids).await?;
    Ok(outputs.iter().map(|(_, output)| output.amount()).sum())
}
