use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    coordinator::{CoordinatorHandle, CycleState},
    cycle_stats::CycleCountersSnapshot,
    models::{Block, BlockSummary, Snapshot},
    numeric::{BigNum, BlockNumber},
};

#[derive(Clone)]
pub struct AppState {
    pub handle: CoordinatorHandle,
    pub ether_price: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("no snapshot published yet")]
    NoSnapshot,
    #[error("invalid block number {0:?}")]
    InvalidBlockNumber(String),
    #[error("block {0} is not in the current window")]
    BlockNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NoSnapshot => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidBlockNumber(_) => StatusCode::BAD_REQUEST,
            ApiError::BlockNotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state: CycleState,
}

#[derive(Serialize)]
struct SnapshotResponse {
    ether_price: f64,
    latest_block_time: u64,
    #[serde(flatten)]
    snapshot: Snapshot,
}

#[derive(Serialize)]
struct BlocksResponse {
    blocks: Vec<BlockSummary>,
}

#[derive(Serialize)]
struct StatsResponse {
    chain: String,
    latest_block_number: BlockNumber,
    latest_block_time: u64,
    average_transactions_per_block: f64,
    average_gas_price_wei: BigNum,
    average_gas_price_gwei: f64,
    ether_price: f64,
}

impl AppState {
    fn current(&self) -> Result<Arc<Snapshot>, ApiError> {
        self.handle.current().ok_or(ApiError::NoSnapshot)
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        state: state.handle.state(),
    })
}

async fn snapshot(State(state): State<AppState>) -> Result<Json<SnapshotResponse>, ApiError> {
    let snapshot = state.current()?;
    Ok(Json(SnapshotResponse {
        ether_price: state.ether_price,
        latest_block_time: snapshot.latest_block_time(),
        snapshot: Snapshot::clone(&snapshot),
    }))
}

async fn blocks(State(state): State<AppState>) -> Result<Json<BlocksResponse>, ApiError> {
    let snapshot = state.current()?;
    Ok(Json(BlocksResponse {
        blocks: snapshot.block_summaries(),
    }))
}

async fn block_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Block>, ApiError> {
    let snapshot = state.current()?;
    if id == "pending" {
        return snapshot
            .window
            .pending()
            .cloned()
            .map(Json)
            .ok_or(ApiError::BlockNotFound(id));
    }
    let number: BlockNumber = id
        .parse()
        .map_err(|_| ApiError::InvalidBlockNumber(id.clone()))?;
    snapshot
        .find_block(&number)
        .cloned()
        .map(Json)
        .ok_or(ApiError::BlockNotFound(id))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let snapshot = state.current()?;
    let statistics = &snapshot.statistics;
    Ok(Json(StatsResponse {
        chain: snapshot.chain_label.clone(),
        latest_block_number: snapshot.latest_block_number.clone(),
        latest_block_time: snapshot.latest_block_time(),
        average_transactions_per_block: statistics.average_transactions_per_block,
        average_gas_price_wei: statistics.average_gas_price.quotient(),
        average_gas_price_gwei: statistics.average_gas_price_gwei(),
        ether_price: state.ether_price,
    }))
}

async fn cycle_stats(State(state): State<AppState>) -> Json<CycleCountersSnapshot> {
    Json(state.handle.counters())
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(snapshot))
        .route("/blocks", get(blocks))
        .route("/block/:id", get(block_detail))
        .route("/stats", get(stats))
        .route("/stats/cycles", get(cycle_stats))
        .with_state(state)
}

pub async fn run_http_server(addr: &str, state: AppState) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
