//! The Tessera ledger node.
//!
//! Owns the ledger state and its persistent store. HTTP handlers run on
//! their own tasks and reach the ledger only through the command channel,
//! so transactions are applied one at a time in arrival order.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use tessera_ledger::api::{
    AliasOutputResponse, FaucetResponse, NodeInfo, OutputIdsResponse, OutputWithId,
    OutputsResponse, SubmitTransactionResponse,
};
use tessera_ledger::{unix_now, AppliedTransaction, LedgerError, LedgerState, ProtocolParameters};

use crate::commands::{NodeCommand, NodeError};
use crate::config::NodeConfig;
use crate::state::NodeState;
use crate::storage::Storage;

pub struct TesseraNode {
    /// Node configuration.
    config: NodeConfig,
    /// Ledger state, moved into the event loop by `run`.
    ledger: Option<LedgerState>,
    /// Persistent storage, moved into the event loop by `run`.
    storage: Option<Storage>,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
    /// Address the API server is bound to.
    api_addr: Option<SocketAddr>,
}

impl TesseraNode {
    pub fn new(config: NodeConfig) -> Result<Self> {
        if !tessera_core::constants::is_valid_network_hrp(&config.network.hrp) {
            anyhow::bail!("invalid network hrp '{}'", config.network.hrp);
        }
        tracing::info!(hrp = %config.network.hrp, "Tessera node created");
        Ok(Self {
            config,
            ledger: None,
            storage: None,
            node_state: None,
            command_rx: None,
            api_addr: None,
        })
    }

    /// Open storage, rebuild the ledger and start the HTTP API.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting Tessera node");

        let storage = Storage::open(&self.config.storage.data_dir)?;
        let params = self.load_parameters(&storage)?;
        let outputs = storage.load_outputs()?;
        tracing::info!(
            path = %self.config.storage.data_dir.display(),
            outputs = outputs.len(),
            "storage initialized"
        );
        let ledger = LedgerState::from_outputs(params.clone(), outputs);

        // Create the NodeCommand channel (HTTP API → main event loop)
        let (command_tx, command_rx) = mpsc::channel::<NodeCommand>(256);

        let info = NodeInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            network_hrp: params.network_hrp,
            rent_structure: params.rent_structure,
            faucet_amount: params.faucet_amount,
        };
        let node_state = Arc::new(NodeState::new(info, command_tx));

        let listener = tokio::net::TcpListener::bind(self.config.api_socket_addr()?).await?;
        let api_addr = listener.local_addr()?;
        let api_state = node_state.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::api::start_api_server(listener, api_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });

        self.ledger = Some(ledger);
        self.storage = Some(storage);
        self.node_state = Some(node_state);
        self.command_rx = Some(command_rx);
        self.api_addr = Some(api_addr);

        Ok(())
    }

    /// Run the node's main event loop until the command channel closes.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let mut ledger = self
            .ledger
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let storage = self
            .storage
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        tracing::info!("entering main event loop");

        while let Some(cmd) = command_rx.recv().await {
            tracing::debug!(command = cmd.name(), "handling API command");
            Self::handle_api_command(cmd, &mut ledger, &storage);
        }

        tracing::info!("API command channel closed");
        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Tessera node");

        self.node_state = None;
        self.command_rx = None;

        if let Some(storage) = self.storage.take() {
            drop(storage);
            tracing::info!("storage closed");
        }

        tracing::info!("Tessera node shut down");
        Ok(())
    }

    pub fn api_addr(&self) -> Option<SocketAddr> {
        self.api_addr
    }

    /// Parameters stored with the data take precedence over the config, so
    /// existing outputs keep the rules they were created under.
    fn load_parameters(&self, storage: &Storage) -> Result<ProtocolParameters> {
        let configured = self.config.protocol_parameters();
        match storage.get_parameters()? {
            Some(stored) => {
                if stored != configured {
                    tracing::warn!(
                        stored_hrp = %stored.network_hrp,
                        configured_hrp = %configured.network_hrp,
                        "stored protocol parameters differ from config, using stored"
                    );
                }
                Ok(stored)
            }
            None => {
                storage.put_parameters(&configured)?;
                Ok(configured)
            }
        }
    }

    /// Handle a command from the HTTP API.
    fn handle_api_command(cmd: NodeCommand, ledger: &mut LedgerState, storage: &Storage) {
        match cmd {
            NodeCommand::BasicOutputIds { filter, reply } => {
                let items = ledger.basic_output_ids(&filter);
                let _ = reply.send(Ok(OutputIdsResponse { items }));
            }
            NodeCommand::GetOutputs { ids, reply } => {
                let result = ids
                    .into_iter()
                    .map(|output_id| {
                        ledger
                            .get_output(&output_id)
                            .map(|output| OutputWithId {
                                output_id,
                                output: output.clone(),
                            })
                            .ok_or(NodeError::Ledger(LedgerError::OutputNotFound(output_id)))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|items| OutputsResponse { items });
                let _ = reply.send(result);
            }
            NodeCommand::GetAliasOutput { alias_id, reply } => {
                let result = ledger
                    .get_alias_output(&alias_id)
                    .map(|(output_id, output)| AliasOutputResponse {
                        output_id,
                        output: output.clone(),
                    })
                    .ok_or(NodeError::Ledger(LedgerError::AliasNotFound(alias_id)));
                let _ = reply.send(result);
            }
            NodeCommand::SubmitTransaction { transaction, reply } => {
                let result = match ledger.check_transaction(&transaction, unix_now()) {
                    Ok(applied) => persist_then_commit(ledger, applied, |a| storage.apply(a))
                        .map(|applied| SubmitTransactionResponse {
                            transaction_id: applied.transaction_id,
                        }),
                    Err(e) => {
                        tracing::warn!(error = %e, "transaction rejected");
                        Err(NodeError::Ledger(e))
                    }
                };
                let _ = reply.send(result);
            }
            NodeCommand::RequestFunds { address, reply } => {
                let result = ledger
                    .faucet_output(&address)
                    .map_err(NodeError::Ledger)
                    .and_then(|minted| {
                        persist_then_commit(ledger, minted, |a| {
                            a.created
                                .iter()
                                .try_for_each(|(id, output)| storage.put_output(id, output))
                        })
                    })
                    .and_then(|minted| {
                        let (output_id, output) = minted.created.first().ok_or_else(|| {
                            NodeError::Storage("faucet produced no output".into())
                        })?;
                        tracing::info!(address = %address, output_id = %output_id, "Minted faucet output");
                        Ok(FaucetResponse {
                            output_id: *output_id,
                            amount: output.amount(),
                        })
                    });
                let _ = reply.send(result);
            }
        }
    }
}

/// Write a checked change to disk, then apply it in memory. A failed write
/// leaves the in-memory ledger untouched.
fn persist_then_commit<E: std::fmt::Display>(
    ledger: &mut LedgerState,
    applied: AppliedTransaction,
    persist: impl FnOnce(&AppliedTransaction) -> std::result::Result<(), E>,
) -> std::result::Result<AppliedTransaction, NodeError> {
    if let Err(e) = persist(&applied) {
        tracing::error!(
            transaction_id = %applied.transaction_id,
            error = %e,
            "failed to persist change"
        );
        return Err(NodeError::Storage(e.to_string()));
    }
    ledger.commit(&applied);
    Ok(applied)
}
