use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::AggregateRoot;
use tradepost_orders::{ItemRequest, Order, OrderItem, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total: u64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id().to_string(),
            product_id: item.product_id().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            total: item.total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub total: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub version: u64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id_typed().to_string(),
            buyer_id: order.buyer_id().to_string(),
            seller_id: order.seller_id().to_string(),
            total: order.total(),
            status: order.status(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            version: order.version(),
        }
    }
}
