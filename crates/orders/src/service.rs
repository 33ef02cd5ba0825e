//! Order service: the single orchestration point for order creation and
//! status changes.

use std::sync::Arc;

use tradepost_catalog::CatalogLookup;
use tradepost_core::{AggregateRoot, ExpectedVersion, UserId};

use crate::error::{InvalidItems, OrderError};
use crate::order::{Order, OrderId, OrderItem, OrderStatus};
use crate::store::{OrderStore, Pagination};
use crate::validator::{ItemRequest, OrderValidator};

/// Wires validator → aggregate construction → store for creation, and
/// actor classification → transition → store for status changes.
///
/// Each call is an independent unit of work; cross-request consistency is the
/// store's job (see [`OrderStore::update`]). `Conflict` from the store is
/// propagated, never retried here.
pub struct OrderService {
    validator: OrderValidator,
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(catalog: Arc<dyn CatalogLookup>, store: Arc<dyn OrderStore>) -> Self {
        Self {
            validator: OrderValidator::new(catalog),
            store,
        }
    }

    /// Create an order for `buyer_id` from the requested items.
    ///
    /// The only creation entry point: validates every item against the
    /// catalog, enforces the single-seller rule and the self-purchase ban,
    /// snapshots unit prices, and persists the PENDING aggregate.
    pub async fn create_order(
        &self,
        buyer_id: UserId,
        items: &[ItemRequest],
    ) -> Result<Order, OrderError> {
        let validation = self.validator.validate(items).await;

        if !validation.invalid_items.is_empty() {
            return Err(OrderError::Validation(InvalidItems(
                validation.invalid_items,
            )));
        }

        if validation.valid_items.is_empty() {
            return Err(OrderError::NoValidSeller);
        }

        if validation.grouped_by_seller.len() > 1 {
            return Err(OrderError::MultiSeller(validation.grouped_by_seller.len()));
        }

        // Exactly one key at this point.
        let seller_id = *validation
            .grouped_by_seller
            .keys()
            .next()
            .ok_or(OrderError::NoValidSeller)?;

        if seller_id == buyer_id {
            return Err(OrderError::SelfPurchase);
        }

        let order_items = validation
            .valid_items
            .iter()
            .map(|item| OrderItem::new(item.product_id, item.quantity, item.unit_price))
            .collect::<Result<Vec<_>, _>>()?;

        let order = Order::create(buyer_id, seller_id, order_items)?;
        let stored = self.store.create(order).await?;

        tracing::info!(
            order_id = %stored.id_typed(),
            buyer_id = %stored.buyer_id(),
            seller_id = %stored.seller_id(),
            total = stored.total(),
            "order created"
        );

        Ok(stored)
    }

    /// Fetch one order; the caller must be its buyer or seller.
    pub async fn get_order(&self, order_id: OrderId, caller: UserId) -> Result<Order, OrderError> {
        let order = self
            .store
            .read(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.classify_actor(caller).is_none() {
            return Err(OrderError::Unauthorized);
        }

        Ok(order)
    }

    /// Orders the caller placed as buyer, newest first.
    pub async fn list_for_buyer(
        &self,
        buyer_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError> {
        self.store.list_by_buyer(buyer_id, pagination).await
    }

    /// Orders the caller received as seller, newest first.
    pub async fn list_for_seller(
        &self,
        seller_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError> {
        self.store.list_by_seller(seller_id, pagination).await
    }

    /// Move an order to `new_status` on behalf of `caller`.
    ///
    /// Resolves the caller's role by identity comparison against the order's
    /// parties; callers who are neither buyer nor seller are rejected before
    /// the transition function is ever invoked. The write is version-checked;
    /// a concurrent update surfaces as `Conflict`.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        caller: UserId,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .read(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let actor = order
            .classify_actor(caller)
            .ok_or(OrderError::Unauthorized)?;

        let from = order.status();
        let transitioned = order.transition(new_status, actor)?;
        let stored = self
            .store
            .update(transitioned, ExpectedVersion::Exact(order.version()))
            .await?;

        tracing::info!(
            order_id = %stored.id_typed(),
            from = %from,
            to = %stored.status(),
            caller = %caller,
            "order status changed"
        );

        Ok(stored)
    }

    /// Convenience wrapper: seller confirms payment.
    pub async fn mark_paid(&self, order_id: OrderId, caller: UserId) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Paid, caller).await
    }

    /// Convenience wrapper: seller ships the order.
    pub async fn mark_shipped(
        &self,
        order_id: OrderId,
        caller: UserId,
    ) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Shipped, caller)
            .await
    }

    /// Convenience wrapper: buyer confirms delivery.
    pub async fn mark_delivered(
        &self,
        order_id: OrderId,
        caller: UserId,
    ) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Delivered, caller)
            .await
    }

    /// Convenience wrapper: either party cancels a shipped order.
    pub async fn cancel(&self, order_id: OrderId, caller: UserId) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Cancelled, caller)
            .await
    }
}
