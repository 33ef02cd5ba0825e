use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradepost_core::{AggregateId, UserId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = tradepost_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Point-in-time view of a product as the order engine needs it.
///
/// Prices are in the smallest currency unit (e.g., cents). `seller_id` is the
/// owner of the store the product belongs to; `None` means the product is not
/// attached to any store and cannot be purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: u64,
    pub stock: i64,
    pub active: bool,
    pub seller_id: Option<UserId>,
}

impl ProductSnapshot {
    /// Check if the product can be sold at all (must be active).
    pub fn can_be_sold(&self) -> bool {
        self.active
    }
}

impl tradepost_core::ValueObject for ProductSnapshot {}

/// Failure of the lookup itself (driver/transport), not a business outcome.
///
/// "Product not found" is expressed as `Ok(None)`, never as an error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog lookup failed: {0}")]
    Lookup(String),
}

/// Read-only oracle over live product state.
#[async_trait::async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Fetch the current snapshot for a product, or `None` if it does not exist.
    async fn product(&self, id: ProductId) -> Result<Option<ProductSnapshot>, CatalogError>;
}
