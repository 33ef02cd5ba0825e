//! Persistence contract for orders.

use serde::{Deserialize, Serialize};

use tradepost_core::{ExpectedVersion, UserId};

use crate::error::OrderError;
use crate::order::{Order, OrderId};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of orders to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// Durable storage for orders and their items.
///
/// `update` must enforce optimistic concurrency: the write succeeds only when
/// the stored version matches `expected`, and a mismatch surfaces as
/// [`OrderError::Conflict`]. Implementations either re-read inside a
/// transaction or predicate the write on the version column; callers never
/// retry on their own.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a freshly created order (with items). Returns the stored order.
    async fn create(&self, order: Order) -> Result<Order, OrderError>;

    /// Fetch an order by id, or `None` if it does not exist.
    async fn read(&self, id: OrderId) -> Result<Option<Order>, OrderError>;

    /// Persist a status change. Only `status`/`updated_at` are written; the
    /// returned order carries the bumped version.
    async fn update(&self, order: Order, expected: ExpectedVersion) -> Result<Order, OrderError>;

    /// Orders where `buyer_id` is the buyer, newest first.
    async fn list_by_buyer(
        &self,
        buyer_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError>;

    /// Orders where `seller_id` is the seller, newest first.
    async fn list_by_seller(
        &self,
        seller_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError>;
}
