//! Commands dispatched from the HTTP API to the node event loop.

use tessera_core::{Address, AliasId, OutputId};
use tessera_ledger::api::{
    AliasOutputResponse, FaucetResponse, OutputIdsResponse, OutputsResponse,
    SubmitTransactionResponse,
};
use tessera_ledger::{LedgerError, OutputFilter, Transaction};
use tokio::sync::oneshot;

/// Failure of a command, as reported back to the API.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The change could not be persisted and was not applied.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Reply<T> = oneshot::Sender<Result<T, NodeError>>;

/// A command sent from the HTTP API to the node's main event loop.
pub enum NodeCommand {
    /// Ids of unspent basic outputs matching a filter.
    BasicOutputIds {
        filter: OutputFilter,
        reply: Reply<OutputIdsResponse>,
    },
    /// Fetch outputs by id.
    GetOutputs {
        ids: Vec<OutputId>,
        reply: Reply<OutputsResponse>,
    },
    /// The current output of an alias.
    GetAliasOutput {
        alias_id: AliasId,
        reply: Reply<AliasOutputResponse>,
    },
    /// Validate and apply a transaction.
    SubmitTransaction {
        transaction: Box<Transaction>,
        reply: Reply<SubmitTransactionResponse>,
    },
    /// Mint faucet funds to an address.
    RequestFunds {
        address: Address,
        reply: Reply<FaucetResponse>,
    },
}

impl NodeCommand {
    pub fn name(&self) -> &'static str {
        match self {
            NodeCommand::BasicOutputIds { .. } => "basic_output_ids",
            NodeCommand::GetOutputs { .. } => "get_outputs",
            NodeCommand::GetAliasOutput { .. } => "get_alias_output",
            NodeCommand::SubmitTransaction { .. } => "submit_transaction",
            NodeCommand::RequestFunds { .. } => "request_funds",
        }
    }
}
