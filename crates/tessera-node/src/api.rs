//! HTTP API server for the Tessera node.
//!
//! Read-only protocol info is served straight from [`NodeState`]; every
//! ledger access goes through the event loop as a [`NodeCommand`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

use tessera_core::AliasId;
use tessera_ledger::api::{
    AliasOutputResponse, ErrorResponse, FaucetRequest, FaucetResponse, HealthResponse, NodeInfo,
    OutputIdsResponse, OutputsRequest, OutputsResponse, SubmitTransactionResponse, ROUTE_ALIAS,
    ROUTE_BASIC_OUTPUTS, ROUTE_FAUCET, ROUTE_HEALTH, ROUTE_INFO, ROUTE_OUTPUTS,
    ROUTE_TRANSACTIONS,
};
use tessera_ledger::{LedgerError, OutputFilter, Transaction};

use crate::commands::{NodeCommand, NodeError};
use crate::state::NodeState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_info(State(state): State<Arc<NodeState>>) -> Json<NodeInfo> {
    Json(state.info.clone())
}

async fn handle_basic_outputs(
    State(state): State<Arc<NodeState>>,
    Query(filter): Query<OutputFilter>,
) -> ApiResult<OutputIdsResponse> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::BasicOutputIds {
        filter,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_outputs(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<OutputsRequest>,
) -> ApiResult<OutputsResponse> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::GetOutputs {
        ids: req.ids,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_alias(
    State(state): State<Arc<NodeState>>,
    Path(alias_id): Path<String>,
) -> ApiResult<AliasOutputResponse> {
    let alias_id: AliasId = alias_id.parse().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid alias id: {}", e),
            }),
        )
    })?;
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::GetAliasOutput {
        alias_id,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_submit_transaction(
    State(state): State<Arc<NodeState>>,
    Json(transaction): Json<Transaction>,
) -> ApiResult<SubmitTransactionResponse> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::SubmitTransaction {
        transaction: Box::new(transaction),
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_faucet(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<FaucetRequest>,
) -> ApiResult<FaucetResponse> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::RequestFunds {
        address: req.address,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

fn status_for(error: &NodeError) -> StatusCode {
    match error {
        NodeError::Ledger(LedgerError::OutputNotFound(_) | LedgerError::AliasNotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        NodeError::Ledger(_) => StatusCode::BAD_REQUEST,
        NodeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Helper to send a command and await the reply.
async fn send_command_and_await<T: Serialize>(
    state: &Arc<NodeState>,
    cmd: NodeCommand,
    reply_rx: tokio::sync::oneshot::Receiver<Result<T, NodeError>>,
) -> ApiResult<T> {
    state.command_tx.send(cmd).await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "node event loop not running".into(),
            }),
        )
    })?;

    match reply_rx.await {
        Ok(Ok(resp)) => Ok(Json(resp)),
        Ok(Err(e)) => Err((
            status_for(&e),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "event loop dropped the reply channel".into(),
            }),
        )),
    }
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route(ROUTE_HEALTH, get(handle_health))
        .route(ROUTE_INFO, get(handle_info))
        .route(ROUTE_BASIC_OUTPUTS, get(handle_basic_outputs))
        .route(ROUTE_OUTPUTS, post(handle_outputs))
        .route(&format!("{}/{{alias_id}}", ROUTE_ALIAS), get(handle_alias))
        .route(ROUTE_TRANSACTIONS, post(handle_submit_transaction))
        .route(ROUTE_FAUCET, post(handle_faucet))
        .with_state(state)
}

pub async fn start_api_server(listener: TcpListener, state: Arc<NodeState>) -> anyhow::Result<()> {
    let app = build_router(state);
    let listen_addr = listener.local_addr()?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
