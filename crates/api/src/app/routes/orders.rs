use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use tradepost_orders::{OrderId, Pagination};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_buyer_orders))
        .route("/seller", get(list_seller_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_order_status))
        .route("/:id/pay", post(mark_paid))
        .route("/:id/ship", post(mark_shipped))
        .route("/:id/deliver", post(mark_delivered))
        .route("/:id/cancel", post(cancel_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    match services
        .orders
        .create_order(principal.user_id(), &body.items)
        .await
    {
        Ok(order) => {
            (StatusCode::CREATED, Json(dto::OrderResponse::from(&order))).into_response()
        }
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn list_buyer_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    let page = Pagination::new(params.limit, params.offset);
    match services
        .orders
        .list_for_buyer(principal.user_id(), page)
        .await
    {
        Ok(orders) => Json(
            orders
                .iter()
                .map(dto::OrderResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn list_seller_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    let page = Pagination::new(params.limit, params.offset);
    match services
        .orders
        .list_for_seller(principal.user_id(), page)
        .await
    {
        Ok(orders) => Json(
            orders
                .iter()
                .map(dto::OrderResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.get_order(order_id, principal.user_id()).await {
        Ok(order) => Json(dto::OrderResponse::from(&order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .orders
        .update_status(order_id, body.status, principal.user_id())
        .await
    {
        Ok(order) => Json(dto::OrderResponse::from(&order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn mark_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.mark_paid(order_id, principal.user_id()).await {
        Ok(order) => Json(dto::OrderResponse::from(&order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn mark_shipped(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .orders
        .mark_shipped(order_id, principal.user_id())
        .await
    {
        Ok(order) => Json(dto::OrderResponse::from(&order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn mark_delivered(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .orders
        .mark_delivered(order_id, principal.user_id())
        .await
    {
        Ok(order) => Json(dto::OrderResponse::from(&order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.cancel(order_id, principal.user_id()).await {
        Ok(order) => Json(dto::OrderResponse::from(&order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
    })
}
