//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `POST /subscribe`                          – register a wallet and email
//! - `GET  /subscribers/{wallet_address}`       – look up a registered wallet
//! - `POST /transactions`                       – record a transaction manually
//! - `GET  /transactions/{transaction_hash}`    – list records for a hash

mod subscribers;
mod transactions;

use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use wtrk_core::services::StoreError;
use wtrk_sdk::objects::StatusResponse;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(subscribers::router())
        .merge(transactions::router())
}

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A store call failed.
    Store(StoreError),
    /// A required request field is empty.
    MissingFields(&'static str),
    /// The wallet is already registered.
    SubscriberExists,
    SubscriberNotFound,
    /// A record with the transaction hash already exists.
    TransactionExists,
    TransactionNotFound,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "API store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            ApiError::MissingFields(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::SubscriberExists => (StatusCode::CONFLICT, "User already exists"),
            ApiError::SubscriberNotFound => (StatusCode::NOT_FOUND, "User not found"),
            ApiError::TransactionExists => (StatusCode::BAD_REQUEST, "Transaction already exists"),
            ApiError::TransactionNotFound => (StatusCode::NOT_FOUND, "Transaction not found"),
        };
        (status, Json(StatusResponse::error(message))).into_response()
    }
}
