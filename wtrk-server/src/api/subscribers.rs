use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use wtrk_core::entities::Subscriber;
use wtrk_sdk::objects::{StatusResponse, SubscribeRequest, SubscriberResponse};

use super::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/subscribers/{wallet_address}", get(get_subscriber))
}

/// `POST /subscribe` — register a wallet for notifications.
///
/// A wallet can be registered once; a second registration is rejected
/// with 409 and leaves the stored email untouched.
async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::MissingFields("wallet_address and email are required"));
    }

    let subscriber = Subscriber {
        wallet_address: payload.wallet_address.trim().to_string(),
        email: payload.email.trim().to_string(),
    };
    let wallet = subscriber.wallet_address.clone();

    if !state.subscribers.register(subscriber).await? {
        return Err(ApiError::SubscriberExists);
    }

    tracing::info!(wallet = %wallet, "Subscriber registered");
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::success("User subscribed successfully")),
    ))
}

/// `GET /subscribers/{wallet_address}` — exact-match lookup.
async fn get_subscriber(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriber = state
        .subscribers
        .lookup(&wallet_address)
        .await?
        .ok_or(ApiError::SubscriberNotFound)?;

    Ok(Json(SubscriberResponse::from(subscriber)))
}
