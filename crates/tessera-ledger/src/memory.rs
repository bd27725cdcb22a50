use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{Address, AliasId, OutputId, TransactionId};
use tokio::sync::RwLock;

use crate::client::LedgerClient;
use crate::error::LedgerError;
use crate::output::{AliasOutput, Output, OutputFilter, ProtocolParameters, RentStructure};
use crate::state::LedgerState;
use crate::transaction::Transaction;

/// In-process ledger. Cloning shares the underlying state.
#[derive(Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    pub fn new(params: ProtocolParameters) -> Self {
        Self::from_state(LedgerState::new(params))
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Shared handle to the state, for callers that persist it.
    pub fn state(&self) -> Arc<RwLock<LedgerState>> {
        Arc::clone(&self.state)
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> u32 {
    chrono::Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn network_hrp(&self) -> Result<String, LedgerError> {
        Ok(self.state.read().await.params().network_hrp.clone())
    }

    async fn rent_structure(&self) -> Result<RentStructure, LedgerError> {
        Ok(self.state.read().await.params().rent_structure)
    }

    async fn basic_output_ids(&self, filter: &OutputFilter) -> Result<Vec<OutputId>, LedgerError> {
        Ok(self.state.read().await.basic_output_ids(filter))
    }

    async fn get_outputs(&self, ids: &[OutputId]) -> Result<Vec<(OutputId, Output)>, LedgerError> {
        let state = self.state.read().await;
        ids.iter()
            .map(|id| {
                state
                    .get_output(id)
                    .map(|output| (*id, output.clone()))
                    .ok_or(LedgerError::OutputNotFound(*id))
            })
            .collect()
    }

    async fn get_alias_output(
        &self,
        alias_id: &AliasId,
    ) -> Result<(OutputId, AliasOutput), LedgerError> {
        self.state
            .read()
            .await
            .get_alias_output(alias_id)
            .map(|(id, output)| (id, output.clone()))
            .ok_or(LedgerError::AliasNotFound(*alias_id))
    }

    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionId, LedgerError> {
        let applied = self.state.write().await.apply_transaction(tx, unix_now())?;
        Ok(applied.transaction_id)
    }

    async fn request_funds(&self, address: &Address) -> Result<OutputId, LedgerError> {
        let (id, _) = self.state.write().await.mint(address)?;
        Ok(id)
    }
}
