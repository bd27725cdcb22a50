//! State shared between the HTTP handlers.

use tessera_ledger::api::NodeInfo;
use tokio::sync::mpsc;

use crate::commands::NodeCommand;

pub struct NodeState {
    /// Protocol parameters served by `/info`. Fixed for the node's lifetime.
    pub info: NodeInfo,
    /// Channel to send commands to the event loop.
    pub command_tx: mpsc::Sender<NodeCommand>,
}

impl NodeState {
    pub fn new(info: NodeInfo, command_tx: mpsc::Sender<NodeCommand>) -> Self {
        Self { info, command_tx }
    }
}
