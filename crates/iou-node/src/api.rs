//! HTTP API server for the IOU node.
//!
//! Every route below `/api/v1/{party}` acts as the hosted party whose
//! organisation name is `{party}`. Queries read the party's vault directly;
//! mutations go through the node event loop and block until the flow has
//! finalised.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;

use iou_core::{Amount, CashHolding, Currency, DebtNote, LinearId, StateAndRef};
use iou_flows::ServiceHub;

use crate::commands::{CommandResponse, NodeCommand, Reply};
use crate::state::NodeState;

// --- Request / response types ---

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub started_at: String,
    pub uptime_secs: u64,
    pub parties: Vec<String>,
    pub notaries: Vec<String>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub me: String,
}

#[derive(Serialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct IssueRequest {
    /// Whole units of `currency`.
    pub amount: u64,
    pub currency: String,
    /// Payee, by organisation or full X.500 name.
    pub counterparty: String,
}

#[derive(Deserialize)]
pub struct TransferRequest {
    pub new_payee: String,
}

#[derive(Deserialize)]
pub struct SettleRequest {
    pub amount: u64,
    pub currency: String,
}

#[derive(Deserialize)]
pub struct SelfIssueCashRequest {
    pub amount: u64,
    pub currency: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn lookup(state: &NodeState, party: &str) -> Result<Arc<ServiceHub>, ApiError> {
    state
        .hub(party)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown party: {}", party)))
}

fn parse_amount(amount: u64, currency: &str) -> Result<Amount, ApiError> {
    let currency: Currency = currency
        .parse()
        .map_err(|e: iou_core::CoreError| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Amount::from_major(amount, currency).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn parse_id(id: &str) -> Result<LinearId, ApiError> {
    id.parse()
        .map_err(|e: iou_core::CoreError| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Send a command to the event loop and wait for its flow to finish.
async fn dispatch(
    state: &NodeState,
    make: impl FnOnce(Reply) -> NodeCommand,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    state.command_tx.send(make(reply_tx)).await.map_err(|_| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "node event loop not running")
    })?;

    match reply_rx.await {
        Ok(Ok(resp)) => Ok((StatusCode::CREATED, Json(resp))),
        Ok(Err(e)) => Err(api_error(StatusCode::BAD_REQUEST, e)),
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "event loop dropped the reply channel",
        )),
    }
}

// --- Handlers ---

async fn handle_status(State(state): State<Arc<NodeState>>) -> Json<StatusResponse> {
    let map = state.network.network_map();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        parties: state
            .network
            .nodes()
            .iter()
            .map(|n| n.our_identity().name.to_string())
            .collect(),
        notaries: map
            .notary_identities()
            .iter()
            .map(|n| n.name.to_string())
            .collect(),
    })
}

async fn handle_me(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
) -> Result<Json<MeResponse>, ApiError> {
    let hub = lookup(&state, &party)?;
    Ok(Json(MeResponse {
        me: hub.our_identity().name.to_string(),
    }))
}

async fn handle_peers(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
) -> Result<Json<PeersResponse>, ApiError> {
    let hub = lookup(&state, &party)?;
    let peers: Vec<String> = hub
        .network_map
        .peers(hub.our_identity())
        .iter()
        .map(|p| p.name.to_string())
        .collect();
    let count = peers.len();
    Ok(Json(PeersResponse { peers, count }))
}

async fn handle_ious(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
) -> Result<Json<Vec<StateAndRef<DebtNote>>>, ApiError> {
    let hub = lookup(&state, &party)?;
    Ok(Json(hub.vault.unconsumed_notes()))
}

async fn handle_cash(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
) -> Result<Json<Vec<StateAndRef<CashHolding>>>, ApiError> {
    let hub = lookup(&state, &party)?;
    Ok(Json(hub.vault.unconsumed_cash()))
}

async fn handle_cash_balances(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
) -> Result<Json<BTreeMap<Currency, Amount>>, ApiError> {
    let hub = lookup(&state, &party)?;
    hub.vault
        .cash_balances()
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn handle_issue(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let hub = lookup(&state, &party)?;
    let amount = parse_amount(req.amount, &req.currency)?;
    dispatch(&state, |reply| NodeCommand::Issue {
        hub,
        amount,
        counterparty: req.counterparty,
        reply,
    })
    .await
}

async fn handle_transfer(
    State(state): State<Arc<NodeState>>,
    Path((party, id)): Path<(String, String)>,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let hub = lookup(&state, &party)?;
    let id = parse_id(&id)?;
    dispatch(&state, |reply| NodeCommand::Transfer {
        hub,
        id,
        new_payee: req.new_payee,
        reply,
    })
    .await
}

async fn handle_settle(
    State(state): State<Arc<NodeState>>,
    Path((party, id)): Path<(String, String)>,
    Json(req): Json<SettleRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let hub = lookup(&state, &party)?;
    let id = parse_id(&id)?;
    let amount = parse_amount(req.amount, &req.currency)?;
    dispatch(&state, |reply| NodeCommand::Settle {
        hub,
        id,
        amount,
        reply,
    })
    .await
}

async fn handle_self_issue_cash(
    State(state): State<Arc<NodeState>>,
    Path(party): Path<String>,
    Json(req): Json<SelfIssueCashRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let hub = lookup(&state, &party)?;
    let amount = parse_amount(req.amount, &req.currency)?;
    dispatch(&state, |reply| NodeCommand::SelfIssueCash { hub, amount, reply }).await
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/{party}/me", get(handle_me))
        .route("/api/v1/{party}/peers", get(handle_peers))
        .route("/api/v1/{party}/ious", get(handle_ious).post(handle_issue))
        .route("/api/v1/{party}/ious/{id}/transfer", post(handle_transfer))
        .route("/api/v1/{party}/ious/{id}/settle", post(handle_settle))
        .route("/api/v1/{party}/cash", get(handle_cash).post(handle_self_issue_cash))
        .route("/api/v1/{party}/cash-balances", get(handle_cash_balances))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: Arc<NodeState>) -> anyhow::Result<()> {
    let app = build_router(state);
    let listen_addr = listener.local_addr()?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
