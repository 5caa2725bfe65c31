use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use wtrk_core::config::DedupMode;
use wtrk_core::entities::TransactionRecord;
use wtrk_sdk::objects::{CreateTransactionRequest, StatusResponse, TransactionResponse};

use super::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transactions/{transaction_hash}", get(get_transactions))
}

/// `POST /transactions` — record a transaction outside the pipeline.
///
/// Rejected if any record with the same transaction hash exists,
/// regardless of wallet.
async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::MissingFields(
            "wallet_address, contract_address and transaction_hash are required",
        ));
    }

    let record = TransactionRecord {
        wallet_address: payload.wallet_address.trim().to_string(),
        contract_address: payload.contract_address.trim().to_string(),
        transaction_hash: payload.transaction_hash.trim().to_string(),
    };

    let existing = state.records.find_by_hash(&record.transaction_hash).await?;
    if !existing.is_empty() {
        return Err(ApiError::TransactionExists);
    }

    let transaction_hash = record.transaction_hash.clone();
    state
        .records
        .insert(record, DedupMode::Unconditional)
        .await?;

    tracing::info!(transaction_hash = %transaction_hash, "Transaction recorded via API");
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::success("Transaction recorded")),
    ))
}

/// `GET /transactions/{transaction_hash}` — all records carrying the hash,
/// oldest first.
async fn get_transactions(
    State(state): State<AppState>,
    Path(transaction_hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.records.find_by_hash(&transaction_hash).await?;
    if records.is_empty() {
        return Err(ApiError::TransactionNotFound);
    }

    let body: Vec<TransactionResponse> = records.into_iter().map(Into::into).collect();
    Ok(Json(body))
}
