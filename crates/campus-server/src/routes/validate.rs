//! Dry-run of the form validators, so clients can check a payload before
//! submitting it.

use axum::Router;
use axum::extract::Path;
use axum::routing::post;
use serde::de::DeserializeOwned;
use serde_json::Value;

use campus_core::responses::MessageResponse;
use campus_core::validation::{
    BatchForm, CourseForm, EnrollmentForm, OrderParams, PaymentParams, SessionForm, UserForm,
    validate_batch_data, validate_course_data, validate_enrollment_data, validate_order_params,
    validate_payment_params, validate_session_data, validate_user_data,
};

use crate::error::{AppError, AppResult};
use crate::json::Json;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/validate/{entity}", post(validate))
}

fn check<T: DeserializeOwned>(
    payload: Value,
    validator: fn(&T) -> Vec<String>,
) -> AppResult<Vec<String>> {
    let form: T = serde_json::from_value(payload)
        .map_err(|e| AppError::BadRequest(format!("Malformed payload: {e}")))?;
    Ok(validator(&form))
}

fn run(entity: &str, payload: Value) -> AppResult<Vec<String>> {
    match entity {
        "course" => check::<CourseForm>(payload, validate_course_data),
        "batch" => check::<BatchForm>(payload, validate_batch_data),
        "enrollment" => check::<EnrollmentForm>(payload, validate_enrollment_data),
        "session" => check::<SessionForm>(payload, validate_session_data),
        "user" => check::<UserForm>(payload, validate_user_data),
        "order" => check::<OrderParams>(payload, validate_order_params),
        "payment" => check::<PaymentParams>(payload, validate_payment_params),
        other => Err(AppError::NotFound(format!("Unknown entity: {other}"))),
    }
}

async fn validate(
    Path(entity): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<MessageResponse>> {
    let errors = run(&entity, payload)?;
    if errors.is_empty() {
        Ok(Json(MessageResponse::new("Validation passed")))
    } else {
        Err(AppError::Validation(errors))
    }
}
