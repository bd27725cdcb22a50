//! Wire types of the node's HTTP API, shared by the server and
//! [`crate::HttpLedgerClient`].

use serde::{Deserialize, Serialize};
use tessera_core::{Address, OutputId, TransactionId};

use crate::output::{AliasOutput, Output, RentStructure};

pub const ROUTE_HEALTH: &str = "/api/v1/health";
pub const ROUTE_INFO: &str = "/api/v1/info";
pub const ROUTE_BASIC_OUTPUTS: &str = "/api/v1/outputs/basic";
pub const ROUTE_OUTPUTS: &str = "/api/v1/outputs";
pub const ROUTE_ALIAS: &str = "/api/v1/alias";
pub const ROUTE_TRANSACTIONS: &str = "/api/v1/transactions";
pub const ROUTE_FAUCET: &str = "/api/v1/faucet/enqueue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub version: String,
    pub network_hrp: String,
    pub rent_structure: RentStructure,
    pub faucet_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputIdsResponse {
    pub items: Vec<OutputId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputsRequest {
    pub ids: Vec<OutputId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputWithId {
    pub output_id: OutputId,
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputsResponse {
    pub items: Vec<OutputWithId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasOutputResponse {
    pub output_id: OutputId,
    pub output: AliasOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetRequest {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetResponse {
    pub output_id: OutputId,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
