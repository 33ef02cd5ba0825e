//! In-memory catalog and order store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use tradepost_catalog::{CatalogError, CatalogLookup, ProductId, ProductSnapshot};
use tradepost_core::{AggregateRoot, ExpectedVersion, UserId};
use tradepost_orders::{Order, OrderError, OrderId, OrderStore, Pagination};

/// In-memory product snapshots behind the `CatalogLookup` contract.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a snapshot (test/dev seeding).
    pub fn upsert(&self, snapshot: ProductSnapshot) {
        if let Ok(mut map) = self.products.write() {
            map.insert(snapshot.id, snapshot);
        }
    }
}

#[async_trait::async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<ProductSnapshot>, CatalogError> {
        let map = self
            .products
            .read()
            .map_err(|_| CatalogError::Lookup("catalog lock poisoned".to_string()))?;
        Ok(map.get(&id).cloned())
    }
}

/// In-memory order store with version-checked updates.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn with_version(order: &Order, version: u64) -> Order {
    Order::rehydrate(
        order.id_typed(),
        order.buyer_id(),
        order.seller_id(),
        order.total(),
        order.status(),
        order.created_at(),
        order.updated_at(),
        order.items().to_vec(),
        version,
    )
}

fn paginate(mut orders: Vec<Order>, pagination: Pagination) -> Vec<Order> {
    // Newest first, like the durable store's ORDER BY created_at DESC.
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    orders
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect()
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<Order, OrderError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| OrderError::storage("order store lock poisoned"))?;

        if orders.contains_key(&order.id_typed()) {
            return Err(OrderError::conflict(format!(
                "order {} already exists",
                order.id_typed()
            )));
        }

        orders.insert(order.id_typed(), order.clone());
        Ok(order)
    }

    async fn read(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| OrderError::storage("order store lock poisoned"))?;
        Ok(orders.get(&id).cloned())
    }

    async fn update(&self, order: Order, expected: ExpectedVersion) -> Result<Order, OrderError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| OrderError::storage("order store lock poisoned"))?;

        let current = orders.get(&order.id_typed()).ok_or(OrderError::NotFound)?;
        expected.check(current.version())?;

        let stored = with_version(&order, current.version() + 1);
        orders.insert(stored.id_typed(), stored.clone());
        Ok(stored)
    }

    async fn list_by_buyer(
        &self,
        buyer_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| OrderError::storage("order store lock poisoned"))?;

        Ok(paginate(
            orders
                .values()
                .filter(|o| o.buyer_id() == buyer_id)
                .cloned()
                .collect(),
            pagination,
        ))
    }

    async fn list_by_seller(
        &self,
        seller_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| OrderError::storage("order store lock poisoned"))?;

        Ok(paginate(
            orders
                .values()
                .filter(|o| o.seller_id() == seller_id)
                .cloned()
                .collect(),
            pagination,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepost_core::AggregateId;
    use tradepost_orders::{Actor, OrderItem, OrderStatus};

    fn sample_order() -> Order {
        let item = OrderItem::new(ProductId::new(AggregateId::new()), 2, 1000).unwrap();
        Order::create(UserId::new(), UserId::new(), vec![item]).unwrap()
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();

        store.create(order.clone()).await.unwrap();
        let loaded = store.read(order.id_typed()).await.unwrap().unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        store.create(order.clone()).await.unwrap();

        let paid = order
            .transition(OrderStatus::Paid, Actor::Seller(order.seller_id()))
            .unwrap();
        let stored = store
            .update(paid, ExpectedVersion::Exact(0))
            .await
            .unwrap();

        assert_eq!(stored.version(), 1);
        assert_eq!(stored.status(), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        store.create(order.clone()).await.unwrap();

        let paid = order
            .transition(OrderStatus::Paid, Actor::Seller(order.seller_id()))
            .unwrap();
        store
            .update(paid.clone(), ExpectedVersion::Exact(0))
            .await
            .unwrap();

        // Second writer raced on the same base version.
        let shipped = paid
            .transition(OrderStatus::Shipped, Actor::Seller(order.seller_id()))
            .unwrap();
        let err = store
            .update(shipped, ExpectedVersion::Exact(0))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_of_unknown_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        let err = store
            .update(order, ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::NotFound);
    }

    #[tokio::test]
    async fn lists_paginate_newest_first() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let seller = UserId::new();

        for _ in 0..3 {
            let item = OrderItem::new(ProductId::new(AggregateId::new()), 1, 500).unwrap();
            let order = Order::create(buyer, seller, vec![item]).unwrap();
            store.create(order).await.unwrap();
        }

        let page = store
            .list_by_buyer(buyer, Pagination::new(Some(2), None))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].created_at() >= page[1].created_at());

        let rest = store
            .list_by_buyer(buyer, Pagination::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);

        let as_seller = store
            .list_by_seller(seller, Pagination::default())
            .await
            .unwrap();
        assert_eq!(as_seller.len(), 3);
    }
}
