//! `PostgreSQL` Ledger Store for GrowHub.
//!
//! [`PostgresLedgerStore`] implements [`LedgerStore`] on a connection pool.
//! Every coordinator transaction runs at READ COMMITTED and takes row locks
//! with `SELECT ... FOR UPDATE`, always in the same order: listings by id,
//! then the event row, then accounts by id. Balance, stock and capacity
//! invariants are additionally guarded by `CHECK` constraints in the schema.
//!
//! # Example
//!
//! ```ignore
//! use growhub_postgres::PostgresLedgerStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresLedgerStore::new("postgres://localhost/growhub").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod tx;

pub use tx::PgLedgerTx;

use growhub_core::store::StoreResult;
use growhub_core::{
    Account, AccountId, EventDetails, EventId, LedgerStore, Listing, ListingId, Order, OrderId,
    OrderItem, Reservation, Sale, StoreError, TicketCategory,
};
use rows::{
    account_from_row, category_from_row, db_error, event_from_row, item_from_row,
    listing_from_row, reservation_from_row, reserved_from_row, status_from_row, tokens_from_sql,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

/// Describe the store-level metrics with the installed recorder.
pub fn register_store_metrics() {
    metrics::describe_counter!(
        "growhub_store_commits_total",
        "Ledger transactions by commit outcome"
    );
}

/// Ledger Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Connect to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection cannot be established.
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Ledger schema migrations applied");
        Ok(())
    }

    async fn categories_by_event(
        &self,
        event_ids: Vec<Uuid>,
    ) -> StoreResult<HashMap<Uuid, Vec<TicketCategory>>> {
        let rows = sqlx::query(
            "SELECT id, event_id, name, price, benefits FROM ticket_categories \
             WHERE event_id = ANY($1) ORDER BY event_id, position",
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut grouped: HashMap<Uuid, Vec<TicketCategory>> = HashMap::new();
        for row in &rows {
            let category = category_from_row(row)?;
            grouped
                .entry(*category.event_id.as_uuid())
                .or_default()
                .push(category);
        }
        Ok(grouped)
    }

    async fn events_with_details(&self, rows: &[PgRow]) -> StoreResult<Vec<EventDetails>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id").map_err(db_error))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut categories = self.categories_by_event(ids).await?;

        rows.iter()
            .map(|row| {
                let event = event_from_row(row)?;
                Ok(EventDetails {
                    categories: categories.remove(event.id.as_uuid()).unwrap_or_default(),
                    reserved: reserved_from_row(row)?,
                    event,
                })
            })
            .collect()
    }
}

const EVENT_WITH_COUNT: &str = "SELECT e.id, e.title, e.description, e.starts_at, e.location, \
     e.capacity, e.created_at, \
     (SELECT COUNT(*) FROM reservations r WHERE r.event_id = e.id) AS reserved \
     FROM events e";

impl LedgerStore for PostgresLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> StoreResult<PgLedgerTx> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        Ok(PgLedgerTx::new(tx))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        sqlx::query("SELECT id, display_name, balance, role, created_at FROM accounts WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }

    async fn find_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        sqlx::query(
            "SELECT id, seller_id, title, description, price, stock, state, created_at, updated_at \
             FROM listings WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(listing_from_row)
        .transpose()
    }

    async fn active_listings(&self) -> StoreResult<Vec<Listing>> {
        let rows = sqlx::query(
            "SELECT id, seller_id, title, description, price, stock, state, created_at, updated_at \
             FROM listings WHERE state = 'active' ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(listing_from_row).collect()
    }

    async fn orders_for_buyer(&self, buyer: AccountId) -> StoreResult<Vec<Order>> {
        let headers = sqlx::query(
            "SELECT id, buyer_id, total, status, created_at FROM orders \
             WHERE buyer_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(*buyer.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let ids = headers
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id").map_err(db_error))
            .collect::<StoreResult<Vec<_>>>()?;
        let item_rows = sqlx::query(
            "SELECT order_id, id, listing_id, seller_id, title, quantity, unit_price \
             FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &item_rows {
            let (order_id, item) = item_from_row(row)?;
            items.entry(order_id).or_default().push(item);
        }

        headers
            .iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(db_error)?;
                Ok(Order {
                    id: OrderId::from_uuid(id),
                    buyer_id: AccountId::from_uuid(row.try_get("buyer_id").map_err(db_error)?),
                    items: items.remove(&id).unwrap_or_default(),
                    total: tokens_from_sql(row.try_get("total").map_err(db_error)?)?,
                    status: status_from_row(row)?,
                    created_at: row.try_get("created_at").map_err(db_error)?,
                })
            })
            .collect()
    }

    async fn sales_for_seller(&self, seller: AccountId) -> StoreResult<Vec<Sale>> {
        let rows = sqlx::query(
            "SELECT oi.order_id, oi.id, oi.listing_id, oi.seller_id, oi.title, oi.quantity, \
             oi.unit_price, o.buyer_id, o.status, o.created_at \
             FROM order_items oi \
             JOIN orders o ON o.id = oi.order_id \
             JOIN listings l ON l.id = oi.listing_id \
             WHERE l.seller_id = $1 \
             ORDER BY o.created_at DESC, oi.order_id, oi.position",
        )
        .bind(*seller.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                let (order_id, item) = item_from_row(row)?;
                Ok(Sale {
                    order_id: OrderId::from_uuid(order_id),
                    buyer_id: AccountId::from_uuid(row.try_get("buyer_id").map_err(db_error)?),
                    status: status_from_row(row)?,
                    item,
                    created_at: row.try_get("created_at").map_err(db_error)?,
                })
            })
            .collect()
    }

    async fn find_event(&self, id: EventId) -> StoreResult<Option<EventDetails>> {
        let sql = format!("{EVENT_WITH_COUNT} WHERE e.id = $1");
        let rows = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(self.events_with_details(&rows).await?.into_iter().next())
    }

    async fn list_events(&self) -> StoreResult<Vec<EventDetails>> {
        let sql = format!("{EVENT_WITH_COUNT} ORDER BY e.starts_at, e.id");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        self.events_with_details(&rows).await
    }

    async fn reservations_for_account(&self, account: AccountId) -> StoreResult<Vec<Reservation>> {
        let rows = sqlx::query(
            "SELECT id, account_id, category_id, event_id, code, price, created_at \
             FROM reservations WHERE account_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(*account.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(reservation_from_row).collect()
    }
}
