use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tradepost_orders::OrderError;

pub fn order_error_to_response(err: OrderError) -> axum::response::Response {
    match err {
        OrderError::Validation(items) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", items.to_string())
        }
        OrderError::MultiSeller(_) => json_error(
            StatusCode::BAD_REQUEST,
            "multi_seller",
            err.to_string(),
        ),
        OrderError::NoValidSeller => json_error(
            StatusCode::BAD_REQUEST,
            "no_valid_seller",
            err.to_string(),
        ),
        OrderError::SelfPurchase => json_error(
            StatusCode::BAD_REQUEST,
            "self_purchase",
            err.to_string(),
        ),
        OrderError::InvalidTransition { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_transition",
            err.to_string(),
        ),
        OrderError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", err.to_string())
        }
        OrderError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        OrderError::Invariant(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        OrderError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        OrderError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
