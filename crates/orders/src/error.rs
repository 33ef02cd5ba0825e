//! Order engine error taxonomy.

use thiserror::Error;

use crate::order::OrderStatus;
use crate::validator::InvalidItem;

/// Invalid items from a creation request, carried verbatim into the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidItems(pub Vec<InvalidItem>);

impl core::fmt::Display for InvalidItems {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for item in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", item.product_id, item.reason)?;
            first = false;
        }
        Ok(())
    }
}

/// Everything the order engine can refuse to do, in one place.
///
/// All variants are per-request: the engine holds no state across failures
/// and never retries on its own. `Conflict` is the one variant a caller may
/// reasonably retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// One or more requested items failed product/stock checks.
    #[error("invalid order items: {0}")]
    Validation(InvalidItems),

    /// Valid items span more than one seller; the order must be split.
    #[error("all order items must belong to the same seller ({0} sellers found)")]
    MultiSeller(usize),

    /// No valid items remained after filtering (including an empty request).
    #[error("order contains no purchasable items")]
    NoValidSeller,

    /// The buyer is the resolved seller.
    #[error("buyer cannot purchase their own products")]
    SelfPurchase,

    /// The attempted status change is not in the legal transition table.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Actor is neither buyer nor seller, or holds the wrong role for the
    /// attempted transition.
    #[error("actor is not authorized for this order")]
    Unauthorized,

    /// Order id unknown on read/update.
    #[error("order not found")]
    NotFound,

    /// A structural invariant was violated at construction time.
    #[error("order invariant violated: {0}")]
    Invariant(String),

    /// Concurrent modification detected at the store layer. Retryable.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Store/driver failure (not a business outcome).
    #[error("storage error: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<tradepost_core::DomainError> for OrderError {
    fn from(err: tradepost_core::DomainError) -> Self {
        match err {
            tradepost_core::DomainError::Conflict(msg) => OrderError::Conflict(msg),
            tradepost_core::DomainError::NotFound => OrderError::NotFound,
            tradepost_core::DomainError::Unauthorized => OrderError::Unauthorized,
            other => OrderError::Invariant(other.to_string()),
        }
    }
}
