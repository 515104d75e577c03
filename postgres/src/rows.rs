//! Row decoding and column conversions.
//!
//! Amounts and counts are stored as `BIGINT`; a value that does not fit the
//! domain type means the ledger was written outside this crate and surfaces as
//! [`StoreError::Integrity`].

use growhub_core::{
    Account, AccountId, Event, EventId, Listing, ListingId, ListingState, OrderItem, OrderItemId,
    OrderStatus, Reservation, ReservationId, Role, StoreError, TicketCategory, TicketCategoryId,
    Tokens,
};
use growhub_core::store::StoreResult;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row};
use uuid::Uuid;

/// Map a driver error, folding constraint violations into integrity errors.
pub(crate) fn db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation()
            || db_err.is_check_violation()
            || db_err.is_foreign_key_violation()
        {
            return StoreError::Integrity(db_err.message().to_string());
        }
    }
    StoreError::Database(e.to_string())
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(db_error)
}

pub(crate) fn tokens_to_sql(amount: Tokens) -> StoreResult<i64> {
    i64::try_from(amount.get())
        .map_err(|_| StoreError::Integrity(format!("{amount} exceeds the storable range")))
}

pub(crate) fn tokens_from_sql(raw: i64) -> StoreResult<Tokens> {
    u64::try_from(raw)
        .map(Tokens::new)
        .map_err(|_| StoreError::Integrity(format!("negative amount {raw} in ledger")))
}

pub(crate) fn count_from_sql(raw: i64) -> StoreResult<u32> {
    u32::try_from(raw).map_err(|_| StoreError::Integrity(format!("count {raw} out of range")))
}

pub(crate) fn account_from_row(row: &PgRow) -> StoreResult<Account> {
    let role: String = col(row, "role")?;
    Ok(Account {
        id: AccountId::from_uuid(col(row, "id")?),
        display_name: col(row, "display_name")?,
        balance: tokens_from_sql(col(row, "balance")?)?,
        role: Role::parse(&role)
            .ok_or_else(|| StoreError::Integrity(format!("unknown role {role:?}")))?,
        created_at: col(row, "created_at")?,
    })
}

pub(crate) fn listing_from_row(row: &PgRow) -> StoreResult<Listing> {
    let state: String = col(row, "state")?;
    Ok(Listing {
        id: ListingId::from_uuid(col(row, "id")?),
        seller_id: AccountId::from_uuid(col(row, "seller_id")?),
        title: col(row, "title")?,
        description: col(row, "description")?,
        price: tokens_from_sql(col(row, "price")?)?,
        stock: count_from_sql(col(row, "stock")?)?,
        state: ListingState::parse(&state)
            .ok_or_else(|| StoreError::Integrity(format!("unknown listing state {state:?}")))?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

pub(crate) fn status_from_row(row: &PgRow) -> StoreResult<OrderStatus> {
    let status: String = col(row, "status")?;
    OrderStatus::parse(&status)
        .ok_or_else(|| StoreError::Integrity(format!("unknown order status {status:?}")))
}

/// Decode an `order_items` row. Expects `order_id` alongside the item columns.
pub(crate) fn item_from_row(row: &PgRow) -> StoreResult<(Uuid, OrderItem)> {
    let order_id: Uuid = col(row, "order_id")?;
    let item = OrderItem {
        id: OrderItemId::from_uuid(col(row, "id")?),
        listing_id: ListingId::from_uuid(col(row, "listing_id")?),
        seller_id: AccountId::from_uuid(col(row, "seller_id")?),
        title: col(row, "title")?,
        quantity: count_from_sql(col(row, "quantity")?)?,
        unit_price: tokens_from_sql(col(row, "unit_price")?)?,
    };
    Ok((order_id, item))
}

pub(crate) fn event_from_row(row: &PgRow) -> StoreResult<Event> {
    Ok(Event {
        id: EventId::from_uuid(col(row, "id")?),
        title: col(row, "title")?,
        description: col(row, "description")?,
        starts_at: col(row, "starts_at")?,
        location: col(row, "location")?,
        capacity: count_from_sql(col(row, "capacity")?)?,
        created_at: col(row, "created_at")?,
    })
}

pub(crate) fn category_from_row(row: &PgRow) -> StoreResult<TicketCategory> {
    Ok(TicketCategory {
        id: TicketCategoryId::from_uuid(col(row, "id")?),
        event_id: EventId::from_uuid(col(row, "event_id")?),
        name: col(row, "name")?,
        price: tokens_from_sql(col(row, "price")?)?,
        benefits: col(row, "benefits")?,
    })
}

pub(crate) fn reservation_from_row(row: &PgRow) -> StoreResult<Reservation> {
    Ok(Reservation {
        id: ReservationId::from_uuid(col(row, "id")?),
        account_id: AccountId::from_uuid(col(row, "account_id")?),
        category_id: TicketCategoryId::from_uuid(col(row, "category_id")?),
        event_id: EventId::from_uuid(col(row, "event_id")?),
        code: col(row, "code")?,
        price: tokens_from_sql(col(row, "price")?)?,
        created_at: col(row, "created_at")?,
    })
}

pub(crate) fn reserved_from_row(row: &PgRow) -> StoreResult<u32> {
    count_from_sql(col(row, "reserved")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_columns_reject_out_of_range_values() {
        assert_eq!(tokens_to_sql(Tokens::new(42)).ok(), Some(42));
        assert!(tokens_to_sql(Tokens::new(u64::MAX)).is_err());
        assert_eq!(tokens_to_sql(Tokens::MAX).ok(), Some(i64::MAX));
        assert_eq!(tokens_from_sql(i64::MAX).ok(), Some(Tokens::MAX));
        assert_eq!(tokens_from_sql(7).ok(), Some(Tokens::new(7)));
        assert!(matches!(tokens_from_sql(-1), Err(StoreError::Integrity(_))));
    }

    #[test]
    fn counts_must_fit_u32() {
        assert_eq!(count_from_sql(3).ok(), Some(3));
        assert!(count_from_sql(-3).is_err());
        assert!(count_from_sql(i64::from(u32::MAX) + 1).is_err());
    }
}
