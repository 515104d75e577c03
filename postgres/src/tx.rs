//! [`LedgerTx`] over a `PostgreSQL` transaction.

use crate::rows::{
    account_from_row, category_from_row, count_from_sql, db_error, event_from_row, item_from_row,
    listing_from_row, status_from_row, tokens_from_sql, tokens_to_sql,
};
use growhub_core::store::StoreResult;
use growhub_core::{
    Account, AccountId, Event, EventId, LedgerTx, Listing, ListingId, Order, OrderId, OrderStatus,
    Reservation, Review, StoreError, TicketCategory, TicketCategoryId, Tokens,
};
use sqlx::postgres::PgQueryResult;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

/// An open ledger transaction. Dropping it without [`LedgerTx::commit`] rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    pub(crate) const fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

/// A targeted update must touch exactly the row it names.
fn expect_one(result: &PgQueryResult, what: &str, id: impl std::fmt::Display) -> StoreResult<()> {
    if result.rows_affected() == 1 {
        Ok(())
    } else {
        Err(StoreError::Integrity(format!("{what} {id} not found")))
    }
}

fn uuids<T>(ids: &[T], as_uuid: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    ids.iter().map(as_uuid).collect()
}

impl LedgerTx for PgLedgerTx {
    async fn lock_accounts(&mut self, ids: &[AccountId]) -> StoreResult<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT id, display_name, balance, role, created_at FROM accounts \
             WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(uuids(ids, |id| *id.as_uuid()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;
        rows.iter().map(account_from_row).collect()
    }

    async fn set_balance(&mut self, id: AccountId, balance: Tokens) -> StoreResult<()> {
        let result = sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(tokens_to_sql(balance)?)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        expect_one(&result, "account", id)
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, display_name, balance, role, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*account.id.as_uuid())
        .bind(&account.display_name)
        .bind(tokens_to_sql(account.balance)?)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn lock_listings(&mut self, ids: &[ListingId]) -> StoreResult<Vec<Listing>> {
        let rows = sqlx::query(
            "SELECT id, seller_id, title, description, price, stock, state, created_at, updated_at \
             FROM listings WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(uuids(ids, |id| *id.as_uuid()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;
        rows.iter().map(listing_from_row).collect()
    }

    async fn set_stock(&mut self, id: ListingId, stock: u32) -> StoreResult<()> {
        let result = sqlx::query("UPDATE listings SET stock = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(i64::from(stock))
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        expect_one(&result, "listing", id)
    }

    async fn insert_listing(&mut self, listing: &Listing) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO listings \
             (id, seller_id, title, description, price, stock, state, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(*listing.id.as_uuid())
        .bind(*listing.seller_id.as_uuid())
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(tokens_to_sql(listing.price)?)
        .bind(i64::from(listing.stock))
        .bind(listing.state.as_str())
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update_listing(&mut self, listing: &Listing) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE listings SET title = $2, description = $3, price = $4, stock = $5, \
             state = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(*listing.id.as_uuid())
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(tokens_to_sql(listing.price)?)
        .bind(i64::from(listing.stock))
        .bind(listing.state.as_str())
        .bind(listing.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        expect_one(&result, "listing", listing.id)
    }

    async fn lock_order(&mut self, id: OrderId) -> StoreResult<Option<Order>> {
        let Some(header) = sqlx::query(
            "SELECT id, buyer_id, total, status, created_at FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            "SELECT order_id, id, listing_id, seller_id, title, quantity, unit_price \
             FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(*id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;
        let items = item_rows
            .iter()
            .map(|row| item_from_row(row).map(|(_, item)| item))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Some(Order {
            id,
            buyer_id: AccountId::from_uuid(header.try_get("buyer_id").map_err(db_error)?),
            items,
            total: tokens_from_sql(header.try_get("total").map_err(db_error)?)?,
            status: status_from_row(&header)?,
            created_at: header.try_get("created_at").map_err(db_error)?,
        }))
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, buyer_id, total, status, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*order.id.as_uuid())
        .bind(*order.buyer_id.as_uuid())
        .bind(tokens_to_sql(order.total)?)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Integrity("too many order lines".to_string()))?;
            sqlx::query(
                "INSERT INTO order_items \
                 (id, order_id, position, listing_id, seller_id, title, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(*item.id.as_uuid())
            .bind(*order.id.as_uuid())
            .bind(position)
            .bind(*item.listing_id.as_uuid())
            .bind(*item.seller_id.as_uuid())
            .bind(&item.title)
            .bind(i64::from(item.quantity))
            .bind(tokens_to_sql(item.unit_price)?)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        }
        Ok(())
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        expect_one(&result, "order", id)
    }

    async fn review_exists(&mut self, order_id: OrderId) -> StoreResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE order_id = $1)")
            .bind(*order_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)
    }

    async fn insert_review(&mut self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO reviews \
             (id, order_id, listing_id, seller_id, reviewer_id, rating, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*review.id.as_uuid())
        .bind(*review.order_id.as_uuid())
        .bind(*review.listing_id.as_uuid())
        .bind(*review.seller_id.as_uuid())
        .bind(*review.reviewer_id.as_uuid())
        .bind(i16::from(review.rating.get()))
        .bind(review.comment.as_deref())
        .bind(review.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn insert_event(&mut self, event: &Event, categories: &[TicketCategory]) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO events (id, title, description, starts_at, location, capacity, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.starts_at)
        .bind(&event.location)
        .bind(i64::from(event.capacity))
        .bind(event.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;

        for (position, category) in categories.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Integrity("too many ticket categories".to_string()))?;
            sqlx::query(
                "INSERT INTO ticket_categories (id, event_id, position, name, price, benefits) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(*category.id.as_uuid())
            .bind(*event.id.as_uuid())
            .bind(position)
            .bind(&category.name)
            .bind(tokens_to_sql(category.price)?)
            .bind(&category.benefits)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        }
        Ok(())
    }

    async fn lock_category(
        &mut self,
        id: TicketCategoryId,
    ) -> StoreResult<Option<(Event, TicketCategory)>> {
        // Categories are immutable once created; the event row is the lock.
        let Some(row) = sqlx::query(
            "SELECT id, event_id, name, price, benefits FROM ticket_categories WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };
        let category = category_from_row(&row)?;

        let event_row = sqlx::query(
            "SELECT id, title, description, starts_at, location, capacity, created_at \
             FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(*category.event_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            StoreError::Integrity(format!("category {id} points at a missing event"))
        })?;

        Ok(Some((event_from_row(&event_row)?, category)))
    }

    async fn count_reservations(&mut self, event_id: EventId) -> StoreResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE event_id = $1")
            .bind(*event_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;
        count_from_sql(count)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO reservations (id, account_id, category_id, event_id, code, price, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*reservation.id.as_uuid())
        .bind(*reservation.account_id.as_uuid())
        .bind(*reservation.category_id.as_uuid())
        .bind(*reservation.event_id.as_uuid())
        .bind(&reservation.code)
        .bind(tokens_to_sql(reservation.price)?)
        .bind(reservation.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        match self.tx.commit().await {
            Ok(()) => {
                metrics::counter!("growhub_store_commits_total", "outcome" => "committed")
                    .increment(1);
                Ok(())
            }
            Err(e) => {
                metrics::counter!("growhub_store_commits_total", "outcome" => "failed")
                    .increment(1);
                tracing::warn!(error = %e, "Ledger transaction failed to commit");
                Err(StoreError::Transaction(e.to_string()))
            }
        }
    }
}
