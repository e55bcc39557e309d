//! Checkout: order creation, signature verification, failure callback.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};

use campus_core::entities::Payment;
use campus_core::responses::{OrderResponse, VerifyPaymentResponse};
use campus_core::validation::PaymentParams;
use campus_db::repos::payment::{NewOrder, PaymentFailure};

use crate::error::AppResult;
use crate::identity::Identity;
use crate::json::Json;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/order", post(create_order))
        .route("/api/payments/verify", post(verify))
        .route("/api/payments/failure", post(failure))
        .route("/api/payments/history", get(history))
}

async fn create_order(
    me: Identity,
    State(state): State<AppState>,
    Json(input): Json<NewOrder>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let order = state
        .service
        .create_order(&me.user_id, &input, &state.payments)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn verify(
    me: Identity,
    State(state): State<AppState>,
    Json(params): Json<PaymentParams>,
) -> AppResult<Json<VerifyPaymentResponse>> {
    Ok(Json(
        state
            .service
            .verify_payment(&me.user_id, &params, &state.payments)
            .await?,
    ))
}

async fn failure(
    me: Identity,
    State(state): State<AppState>,
    Json(failure): Json<PaymentFailure>,
) -> AppResult<Json<Payment>> {
    Ok(Json(
        state
            .service
            .record_payment_failure(&me.user_id, &failure)
            .await?,
    ))
}

async fn history(me: Identity, State(state): State<AppState>) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(state.service.payment_history(&me.user_id).await?))
}
