//! Durable order state.
//!
//! [`OrderStore`] is the seam between orchestration and persistence: the
//! production implementation is [`PgOrderStore`] over sqlx/Postgres, and
//! tests substitute [`crate::testing::InMemoryOrderStore`]. Every mutating
//! call commits its transaction synchronously before returning; no write is
//! buffered across calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{self, NewOrderItem, Order, OrderItem, OrderStatus};
use crate::error::StoreError;

/// Create / read / update-status operations over orders.
///
/// Absent orders are an `Ok(None)` outcome, not an error: only
/// infrastructure failures surface as [`StoreError`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and all of its items atomically.
    ///
    /// The total price is computed here, as the exact decimal sum of
    /// `quantity * price` over the items. If any row insert fails the whole
    /// transaction aborts and no partial order becomes visible.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the transaction cannot be committed.
    async fn create_order(
        &self,
        customer_id: Uuid,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, StoreError>;

    /// Load an order with its items, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for infrastructure failures.
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Transition an order's status, touching `updated_at`.
    ///
    /// Returns `None` without committing anything when the id is unknown,
    /// the expected, recoverable case the consumer handles.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the transaction cannot be committed.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
}

const SELECT_ORDER: &str = "SELECT id, customer_id, status, total_price, created_at, updated_at
     FROM orders WHERE id = $1";

const SELECT_ITEMS: &str = "SELECT id, order_id, product_id, quantity, price
     FROM order_items WHERE order_id = $1 ORDER BY id";

/// Postgres-backed [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the pool cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await?;
        info!("connected to order store");
        Ok(Self { pool })
    }

    /// Run the embedded schema migrations. Safe to call from every binary
    /// at startup; already-applied migrations are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migrate`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(
        &self,
        customer_id: Uuid,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, StoreError> {
        let order_id = Uuid::new_v4();
        let total_price = domain::total_price(&items);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let order_row: OrderRow = sqlx::query_as(
            "INSERT INTO orders (id, customer_id, status, total_price, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING id, customer_id, status, total_price, created_at, updated_at",
        )
        .bind(order_id)
        .bind(customer_id)
        .bind(OrderStatus::New.as_str())
        .bind(total_price)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored_items = Vec::with_capacity(items.len());
        for item in items {
            let row: ItemRow = sqlx::query_as(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, order_id, product_id, quantity, price",
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .fetch_one(&mut *tx)
            .await?;
            stored_items.push(row.into_item());
        }

        tx.commit().await?;
        info!(order_id = %order_id, total_price = %total_price, "order created");

        order_row.into_order(stored_items)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let Some(order_row) = sqlx::query_as::<_, OrderRow>(SELECT_ORDER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let item_rows: Vec<ItemRow> = sqlx::query_as(SELECT_ITEMS)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let items = item_rows.into_iter().map(ItemRow::into_item).collect();
        Ok(Some(order_row.into_order(items)?))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(order_row) = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1
             RETURNING id, customer_id, status, total_price, created_at, updated_at",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        else {
            // Unknown id: nothing to commit.
            return Ok(None);
        };

        let item_rows: Vec<ItemRow> = sqlx::query_as(SELECT_ITEMS)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let items = item_rows.into_iter().map(ItemRow::into_item).collect();
        Ok(Some(order_row.into_order(items)?))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    status: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Integrity(format!(
                "order {} has unknown status {:?}",
                self.id, self.status
            ))
        })?;
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            status,
            total_price: self.total_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
}

impl ItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
        }
    }
}
