//! Ledger Store abstraction.
//!
//! The Ledger Store is the durable record of balances, stock, orders, reviews,
//! events and reservations. Coordinators never mutate it outside a
//! [`LedgerTx`]: they open one with [`LedgerStore::begin`], read the rows they
//! need through the `lock_*` methods, write, and call [`LedgerTx::commit`].
//! Dropping a transaction without committing discards every write.
//!
//! # Isolation contract
//!
//! Rows returned by a `lock_*` method stay locked (or the whole transaction is
//! serialized) until commit or drop, so a read-then-write inside one
//! transaction cannot interleave with a concurrent transaction touching the
//! same rows. [`LedgerTx::lock_category`] locks the owning event, which
//! linearizes capacity checks for that event.
//!
//! Implementations lock in a fixed order to stay deadlock free: listings
//! (by id), then events, then accounts (by id).
//!
//! # Implementations
//!
//! - `PostgresLedgerStore` (in `growhub-postgres`): production
//! - `InMemoryLedgerStore` (in `growhub-testing`): fast, deterministic tests

use crate::error::StoreError;
use crate::types::{
    Account, AccountId, Event, EventDetails, EventId, Listing, ListingId, Order, OrderId,
    OrderStatus, Reservation, Review, Sale, TicketCategory, TicketCategoryId, Tokens,
};
use std::future::Future;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the durable store.
///
/// The read methods observe committed state only and take no locks; they back
/// history views and catalogs, never a decision that is followed by a write.
pub trait LedgerStore: Send + Sync + 'static {
    /// Transaction type produced by [`LedgerStore::begin`].
    type Tx: LedgerTx;

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the store cannot start one.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;

    /// Round-trip to the store, for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the store is unreachable.
    fn ping(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Look up an account.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_account(&self, id: AccountId)
    -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Look up a listing in any state.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_listing(&self, id: ListingId)
    -> impl Future<Output = StoreResult<Option<Listing>>> + Send;

    /// Active listings, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn active_listings(&self) -> impl Future<Output = StoreResult<Vec<Listing>>> + Send;

    /// Orders placed by `buyer`, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn orders_for_buyer(
        &self,
        buyer: AccountId,
    ) -> impl Future<Output = StoreResult<Vec<Order>>> + Send;

    /// Order lines whose listing is owned by `seller`, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn sales_for_seller(
        &self,
        seller: AccountId,
    ) -> impl Future<Output = StoreResult<Vec<Sale>>> + Send;

    /// An event with its categories and reservation count.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_event(
        &self,
        id: EventId,
    ) -> impl Future<Output = StoreResult<Option<EventDetails>>> + Send;

    /// All events, soonest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_events(&self) -> impl Future<Output = StoreResult<Vec<EventDetails>>> + Send;

    /// Reservations held by `account`, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn reservations_for_account(
        &self,
        account: AccountId,
    ) -> impl Future<Output = StoreResult<Vec<Reservation>>> + Send;
}

/// One atomic unit of work against the Ledger Store.
///
/// All methods fail with a [`StoreError`] on driver failure; after any error
/// the caller drops the transaction, which rolls it back.
pub trait LedgerTx: Send {
    // ═══════════════════════════════════════════════════════════════════════
    // Accounts
    // ═══════════════════════════════════════════════════════════════════════

    /// Lock and return the accounts among `ids` that exist.
    fn lock_accounts(
        &mut self,
        ids: &[AccountId],
    ) -> impl Future<Output = StoreResult<Vec<Account>>> + Send;

    /// Overwrite a locked account's balance.
    fn set_balance(
        &mut self,
        id: AccountId,
        balance: Tokens,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert a new account.
    fn insert_account(&mut self, account: &Account)
    -> impl Future<Output = StoreResult<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Listings
    // ═══════════════════════════════════════════════════════════════════════

    /// Lock and return the listings among `ids` that exist, in any state.
    fn lock_listings(
        &mut self,
        ids: &[ListingId],
    ) -> impl Future<Output = StoreResult<Vec<Listing>>> + Send;

    /// Overwrite a locked listing's stock.
    fn set_stock(
        &mut self,
        id: ListingId,
        stock: u32,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert a new listing.
    fn insert_listing(&mut self, listing: &Listing)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrite a locked listing's editable fields.
    fn update_listing(&mut self, listing: &Listing)
    -> impl Future<Output = StoreResult<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Orders and reviews
    // ═══════════════════════════════════════════════════════════════════════

    /// Lock and return an order with its line items.
    fn lock_order(
        &mut self,
        id: OrderId,
    ) -> impl Future<Output = StoreResult<Option<Order>>> + Send;

    /// Insert an order together with all its line items.
    fn insert_order(&mut self, order: &Order) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrite a locked order's status.
    fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Whether a review exists for `order_id`.
    fn review_exists(&mut self, order_id: OrderId)
    -> impl Future<Output = StoreResult<bool>> + Send;

    /// Insert a review.
    fn insert_review(&mut self, review: &Review) -> impl Future<Output = StoreResult<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Events and reservations
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert an event with its categories.
    fn insert_event(
        &mut self,
        event: &Event,
        categories: &[TicketCategory],
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Return a category with its event, locking the event row.
    fn lock_category(
        &mut self,
        id: TicketCategoryId,
    ) -> impl Future<Output = StoreResult<Option<(Event, TicketCategory)>>> + Send;

    /// Reservations across all categories of `event_id`.
    fn count_reservations(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<u32>> + Send;

    /// Insert a reservation.
    fn insert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Completion
    // ═══════════════════════════════════════════════════════════════════════

    /// Make every write of this transaction durable.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;
}
