//! Creation-time validation of requested order items.
//!
//! This is a point-in-time check against the catalog, not a reservation:
//! nothing is decremented here, and two concurrent orders against the same
//! product can both pass. That race is accepted by design; preventing it
//! would require a reservation protocol the store layer does not provide.

use std::collections::HashMap;
use std::sync::Arc;

use tradepost_catalog::{CatalogLookup, ProductId};
use tradepost_core::UserId;

/// One requested line of a proposed order: product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A requested item that passed all checks, with the price snapshotted at
/// validation time and the resolved owning seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: u64,
    pub seller_id: UserId,
}

/// A requested item that failed a check, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidItem {
    pub product_id: ProductId,
    pub reason: String,
}

/// Outcome of validating one creation request. Transient: consumed by the
/// service and discarded, never persisted.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid_items: Vec<ValidItem>,
    pub invalid_items: Vec<InvalidItem>,
    pub grouped_by_seller: HashMap<UserId, Vec<ValidItem>>,
}

/// Validates proposed items against live catalog state.
pub struct OrderValidator {
    catalog: Arc<dyn CatalogLookup>,
}

impl OrderValidator {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }

    /// Validate each requested item independently, in input order.
    ///
    /// Duplicate product ids are not merged: each occurrence is checked
    /// against the full current stock on its own. A failing catalog lookup
    /// marks that item invalid instead of aborting the batch, so sibling
    /// items still get a verdict.
    pub async fn validate(&self, items: &[ItemRequest]) -> ValidationResult {
        let mut result = ValidationResult::default();

        for item in items {
            let product = match self.catalog.product(item.product_id).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(product_id = %item.product_id, error = %e, "catalog lookup failed");
                    result.invalid_items.push(InvalidItem {
                        product_id: item.product_id,
                        reason: "Catalog lookup failed".to_string(),
                    });
                    continue;
                }
            };

            let Some(product) = product else {
                result.invalid_items.push(InvalidItem {
                    product_id: item.product_id,
                    reason: "Product not found".to_string(),
                });
                continue;
            };

            if !product.can_be_sold() {
                result.invalid_items.push(InvalidItem {
                    product_id: item.product_id,
                    reason: "Product is not active".to_string(),
                });
                continue;
            }

            if item.quantity == 0 {
                result.invalid_items.push(InvalidItem {
                    product_id: item.product_id,
                    reason: "Quantity must be greater than 0".to_string(),
                });
                continue;
            }

            if product.stock < i64::from(item.quantity) {
                result.invalid_items.push(InvalidItem {
                    product_id: item.product_id,
                    reason: format!(
                        "Insufficient stock. Available: {}, requested: {}",
                        product.stock, item.quantity
                    ),
                });
                continue;
            }

            let Some(seller_id) = product.seller_id else {
                result.invalid_items.push(InvalidItem {
                    product_id: item.product_id,
                    reason: "Product has no associated store".to_string(),
                });
                continue;
            };

            let valid = ValidItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: product.price,
                seller_id,
            };
            result.valid_items.push(valid);
            result
                .grouped_by_seller
                .entry(seller_id)
                .or_default()
                .push(valid);
        }

        result
    }
}
