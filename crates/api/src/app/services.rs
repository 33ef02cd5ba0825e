use std::sync::Arc;

use sqlx::PgPool;

use tradepost_infra::{InMemoryCatalog, InMemoryOrderStore, PostgresCatalog, PostgresOrderStore};
use tradepost_orders::OrderService;

/// Top-level service container handed to route handlers via `Extension`.
pub struct AppServices {
    pub orders: OrderService,
}

/// Wire the order service against Postgres when `DATABASE_URL` is set,
/// otherwise against the in-memory adapters.
pub async fn build_services() -> anyhow::Result<AppServices> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPool::connect(&url).await?;
            tracing::info!("connected to postgres");
            let catalog = Arc::new(PostgresCatalog::new(pool.clone()));
            let store = Arc::new(PostgresOrderStore::new(pool));
            Ok(AppServices {
                orders: OrderService::new(catalog, store),
            })
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            Ok(AppServices {
                orders: OrderService::new(
                    Arc::new(InMemoryCatalog::new()),
                    Arc::new(InMemoryOrderStore::new()),
                ),
            })
        }
    }
}
