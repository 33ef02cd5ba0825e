//! Postgres-backed catalog lookup and order store.
//!
//! Queries are tenant-free (single marketplace) but follow the same
//! discipline as any durable adapter here: every status update runs inside a
//! transaction and is predicated on the stored version, so a concurrent
//! writer surfaces as a conflict instead of a lost update.
//!
//! Schema lives in `migrations/`.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tradepost_catalog::{CatalogError, CatalogLookup, ProductId, ProductSnapshot};
use tradepost_core::{AggregateId, AggregateRoot, ExpectedVersion, UserId};
use tradepost_orders::{
    Order, OrderError, OrderId, OrderItem, OrderItemId, OrderStatus, OrderStore, Pagination,
};

/// Catalog adapter over the marketplace's `products`/`stores` tables.
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogLookup for PostgresCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<ProductSnapshot>, CatalogError> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.name, p.price, p.stock, p.active, s.owner_id AS seller_id
            FROM products p
            LEFT JOIN stores s ON s.id = p.store_id
            WHERE p.id = $1
            "#,
        )
        .bind(*id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::Lookup(e.to_string()))?;

        row.map(|row| snapshot_from_row(&row))
            .transpose()
            .map_err(|e| CatalogError::Lookup(e.to_string()))
    }
}

fn snapshot_from_row(row: &PgRow) -> Result<ProductSnapshot, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let seller_id: Option<Uuid> = row.try_get("seller_id")?;
    let price: i64 = row.try_get("price")?;

    Ok(ProductSnapshot {
        id: ProductId::new(AggregateId::from_uuid(id)),
        name: row.try_get("name")?,
        price: price.max(0) as u64,
        stock: row.try_get("stock")?,
        active: row.try_get("active")?,
        seller_id: seller_id.map(UserId::from_uuid),
    })
}

/// Order store over `orders` + `order_items`.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderError> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(*order_id.0.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(item_from_row).collect()
    }

    async fn load_orders(&self, rows: Vec<PgRow>) -> Result<Vec<Order>, OrderError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let header = header_from_row(row)?;
            let items = self.load_items(header.id).await?;
            orders.push(header.into_order(items));
        }
        Ok(orders)
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: Order) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, seller_id, total, status, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*order.id_typed().0.as_uuid())
        .bind(*order.buyer_id().as_uuid())
        .bind(*order.seller_id().as_uuid())
        .bind(order.total() as i64)
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(order.version() as i64)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(*item.id().0.as_uuid())
            .bind(*order.id_typed().0.as_uuid())
            .bind(*item.product_id().0.as_uuid())
            .bind(item.quantity() as i32)
            .bind(item.unit_price() as i64)
            .bind(order.created_at())
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(order)
    }

    async fn read(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, total, status, created_at, updated_at, version
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(*id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let header = header_from_row(&row)?;
        let items = self.load_items(header.id).await?;
        Ok(Some(header.into_order(items)))
    }

    async fn update(&self, order: Order, expected: ExpectedVersion) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Row lock: concurrent writers serialize here, then the version
        // check decides the loser.
        let row = sqlx::query("SELECT version FROM orders WHERE id = $1 FOR UPDATE")
            .bind(*order.id_typed().0.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err)?;

        let Some(row) = row else {
            return Err(OrderError::NotFound);
        };
        let current: i64 = row.try_get("version").map_err(storage_err)?;
        expected.check(current as u64)?;

        let new_version = current + 1;
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = $3, version = $4
            WHERE id = $1 AND version = $5
            "#,
        )
        .bind(*order.id_typed().0.as_uuid())
        .bind(order.status().as_str())
        .bind(order.updated_at())
        .bind(new_version)
        .bind(current)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;

        Ok(Order::rehydrate(
            order.id_typed(),
            order.buyer_id(),
            order.seller_id(),
            order.total(),
            order.status(),
            order.created_at(),
            order.updated_at(),
            order.items().to_vec(),
            new_version as u64,
        ))
    }

    async fn list_by_buyer(
        &self,
        buyer_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError> {
        let rows = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, total, status, created_at, updated_at, version
            FROM orders
            WHERE buyer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(*buyer_id.as_uuid())
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        self.load_orders(rows).await
    }

    async fn list_by_seller(
        &self,
        seller_id: UserId,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderError> {
        let rows = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, total, status, created_at, updated_at, version
            FROM orders
            WHERE seller_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(*seller_id.as_uuid())
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        self.load_orders(rows).await
    }
}

/// Decoded `orders` row, before items are attached.
struct OrderHeader {
    id: OrderId,
    buyer_id: UserId,
    seller_id: UserId,
    total: u64,
    status: OrderStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    version: u64,
}

impl OrderHeader {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order::rehydrate(
            self.id,
            self.buyer_id,
            self.seller_id,
            self.total,
            self.status,
            self.created_at,
            self.updated_at,
            items,
            self.version,
        )
    }
}

fn header_from_row(row: &PgRow) -> Result<OrderHeader, OrderError> {
    let id: Uuid = row.try_get("id").map_err(storage_err)?;
    let buyer_id: Uuid = row.try_get("buyer_id").map_err(storage_err)?;
    let seller_id: Uuid = row.try_get("seller_id").map_err(storage_err)?;
    let total: i64 = row.try_get("total").map_err(storage_err)?;
    let status: String = row.try_get("status").map_err(storage_err)?;
    let version: i64 = row.try_get("version").map_err(storage_err)?;

    Ok(OrderHeader {
        id: OrderId::new(AggregateId::from_uuid(id)),
        buyer_id: UserId::from_uuid(buyer_id),
        seller_id: UserId::from_uuid(seller_id),
        total: total.max(0) as u64,
        status: status
            .parse()
            .map_err(|_| OrderError::storage(format!("corrupt order status: {status}")))?,
        created_at: row.try_get("created_at").map_err(storage_err)?,
        updated_at: row.try_get("updated_at").map_err(storage_err)?,
        version: version.max(0) as u64,
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, OrderError> {
    let id: Uuid = row.try_get("id").map_err(storage_err)?;
    let product_id: Uuid = row.try_get("product_id").map_err(storage_err)?;
    let quantity: i32 = row.try_get("quantity").map_err(storage_err)?;
    let unit_price: i64 = row.try_get("unit_price").map_err(storage_err)?;

    Ok(OrderItem::rehydrate(
        OrderItemId::new(AggregateId::from_uuid(id)),
        ProductId::new(AggregateId::from_uuid(product_id)),
        quantity.max(0) as u32,
        unit_price.max(0) as u64,
    ))
}

fn storage_err(e: impl core::fmt::Display) -> OrderError {
    OrderError::storage(e.to_string())
}

/// INSERT error mapping: unique violations are conflicts (duplicate ids),
/// everything else is a storage failure.
fn map_insert_error(e: sqlx::Error) -> OrderError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return OrderError::conflict(db.message().to_string());
        }
    }
    storage_err(e)
}
