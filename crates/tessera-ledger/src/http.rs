use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tessera_core::{Address, AliasId, OutputId, TransactionId};

use crate::api::{
    AliasOutputResponse, ErrorResponse, FaucetRequest, FaucetResponse, NodeInfo,
    OutputIdsResponse, OutputsRequest, OutputsResponse, SubmitTransactionResponse, ROUTE_ALIAS,
    ROUTE_BASIC_OUTPUTS, ROUTE_FAUCET, ROUTE_INFO, ROUTE_OUTPUTS, ROUTE_TRANSACTIONS,
};
use crate::client::LedgerClient;
use crate::error::LedgerError;
use crate::output::{AliasOutput, Output, OutputFilter, RentStructure};
use crate::transaction::Transaction;

/// [`LedgerClient`] speaking to a `tessera-node` over HTTP.
///
/// The faucet may live on a different host than the node.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    node_url: String,
    faucet_url: String,
}

impl HttpLedgerClient {
    pub fn new(node_url: impl Into<String>, faucet_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            node_url: node_url.into().trim_end_matches('/').to_string(),
            faucet_url: faucet_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    pub async fn info(&self) -> Result<NodeInfo, LedgerError> {
        let response = self
            .http
            .get(format!("{}{}", self.node_url, ROUTE_INFO))
            .send()
            .await?;
        decode(response).await
    }
}

/// Map a response to its JSON body, or to [`LedgerError::Api`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(LedgerError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn network_hrp(&self) -> Result<String, LedgerError> {
        Ok(self.info().await?.network_hrp)
    }

    async fn rent_structure(&self) -> Result<RentStructure, LedgerError> {
        Ok(self.info().await?.rent_structure)
    }

    async fn basic_output_ids(&self, filter: &OutputFilter) -> Result<Vec<OutputId>, LedgerError> {
        let response = self
            .http
            .get(format!("{}{}", self.node_url, ROUTE_BASIC_OUTPUTS))
            .query(filter)
            .send()
            .await?;
        let body: OutputIdsResponse = decode(response).await?;
        Ok(body.items)
    }

    async fn get_outputs(&self, ids: &[OutputId]) -> Result<Vec<(OutputId, Output)>, LedgerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .http
            .post(format!("{}{}", self.node_url, ROUTE_OUTPUTS))
            .json(&OutputsRequest { ids: ids.to_vec() })
            .send()
            .await?;
        let body: OutputsResponse = decode(response).await?;
        Ok(body
            .items
            .into_iter()
            .map(|item| (item.output_id, item.output))
            .collect())
    }

    async fn get_alias_output(
        &self,
        alias_id: &AliasId,
    ) -> Result<(OutputId, AliasOutput), LedgerError> {
        let response = self
            .http
            .get(format!("{}{}/{}", self.node_url, ROUTE_ALIAS, alias_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LedgerError::AliasNotFound(*alias_id));
        }
        let body: AliasOutputResponse = decode(response).await?;
        Ok((body.output_id, body.output))
    }

    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionId, LedgerError> {
        let response = self
            .http
            .post(format!("{}{}", self.node_url, ROUTE_TRANSACTIONS))
            .json(tx)
            .send()
            .await?;
        let body: SubmitTransactionResponse = decode(response).await?;
        tracing::debug!(transaction_id = %body.transaction_id, "Transaction accepted");
        Ok(body.transaction_id)
    }

    async fn request_funds(&self, address: &Address) -> Result<OutputId, LedgerError> {
        let response = self
            .http
            .post(format!("{}{}", self.faucet_url, ROUTE_FAUCET))
            .json(&FaucetRequest {
                address: address.clone(),
            })
            .send()
            .await?;
        let body: FaucetResponse = decode(response).await?;
        tracing::debug!(address = %address, amount = body.amount, "Faucet funds received");
        Ok(body.output_id)
    }
}
