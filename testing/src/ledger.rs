//! In-memory Ledger Store.
//!
//! [`InMemoryLedgerStore`] serializes transactions: [`begin`](LedgerStore::begin)
//! takes an owned lock on the whole [`Ledger`] and hands out a working copy.
//! Commit writes the copy back; dropping the transaction discards it. Every
//! transaction therefore sees and produces a consistent state, which makes the
//! store a faithful stand-in for the isolation contract of the real one.
//!
//! Committed reads (`find_*`, history views) wait for any open transaction.
//! Never call them from a task that holds an open transaction.

use growhub_core::error::StoreError;
use growhub_core::store::{LedgerStore, LedgerTx, StoreResult};
use growhub_core::{
    Account, AccountId, Event, EventDetails, EventId, Listing, ListingId, Order, OrderId,
    OrderStatus, Reservation, Review, Sale, TicketCategory, TicketCategoryId, Tokens,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Complete committed state of an in-memory store.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    /// Accounts by id
    pub accounts: BTreeMap<AccountId, Account>,
    /// Listings by id
    pub listings: BTreeMap<ListingId, Listing>,
    /// Orders in insertion order
    pub orders: Vec<Order>,
    /// Reviews in insertion order
    pub reviews: Vec<Review>,
    /// Events by id
    pub events: BTreeMap<EventId, Event>,
    /// Ticket categories by id
    pub categories: BTreeMap<TicketCategoryId, TicketCategory>,
    /// Reservations in insertion order
    pub reservations: Vec<Reservation>,
}

impl Ledger {
    /// Sum of every account balance.
    #[must_use]
    pub fn total_tokens(&self) -> u128 {
        self.accounts
            .values()
            .map(|a| u128::from(a.balance.get()))
            .sum()
    }

    /// Balance of `id`, zero if absent.
    #[must_use]
    pub fn balance(&self, id: AccountId) -> Tokens {
        self.accounts.get(&id).map_or(Tokens::ZERO, |a| a.balance)
    }

    /// Stock of `id`, zero if absent.
    #[must_use]
    pub fn stock(&self, id: ListingId) -> u32 {
        self.listings.get(&id).map_or(0, |l| l.stock)
    }

    fn reserved(&self, event_id: EventId) -> u32 {
        let count = self
            .reservations
            .iter()
            .filter(|r| r.event_id == event_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn event_details(&self, event: &Event) -> EventDetails {
        EventDetails {
            event: event.clone(),
            categories: self
                .categories
                .values()
                .filter(|c| c.event_id == event.id)
                .cloned()
                .collect(),
            reserved: self.reserved(event.id),
        }
    }
}

/// Serializable in-memory Ledger Store for tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedgerStore {
    ledger: Arc<Mutex<Ledger>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryLedgerStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }

    /// Mutate committed state directly, bypassing the coordinators.
    pub async fn seed<F>(&self, f: F)
    where
        F: FnOnce(&mut Ledger),
    {
        let mut ledger = self.ledger.lock().await;
        f(&mut ledger);
    }

    /// Make the next [`LedgerTx::commit`] fail after all its writes were
    /// staged, as a lost connection would.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> StoreResult<InMemoryTx> {
        let guard = Arc::clone(&self.ledger).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx {
            guard,
            working,
            fail_commit: Arc::clone(&self.fail_next_commit),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.ledger.lock().await.accounts.get(&id).cloned())
    }

    async fn find_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        Ok(self.ledger.lock().await.listings.get(&id).cloned())
    }

    async fn active_listings(&self) -> StoreResult<Vec<Listing>> {
        let ledger = self.ledger.lock().await;
        let mut active: Vec<Listing> = ledger
            .listings
            .values()
            .filter(|l| l.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|l| l.created_at);
        Ok(active)
    }

    async fn orders_for_buyer(&self, buyer: AccountId) -> StoreResult<Vec<Order>> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .orders
            .iter()
            .rev()
            .filter(|o| o.buyer_id == buyer)
            .cloned()
            .collect())
    }

    async fn sales_for_seller(&self, seller: AccountId) -> StoreResult<Vec<Sale>> {
        let ledger = self.ledger.lock().await;
        let mut sales = Vec::new();
        for order in ledger.orders.iter().rev() {
            for item in &order.items {
                let owned = ledger
                    .listings
                    .get(&item.listing_id)
                    .is_some_and(|l| l.seller_id == seller);
                if owned {
                    sales.push(Sale {
                        order_id: order.id,
                        buyer_id: order.buyer_id,
                        status: order.status,
                        item: item.clone(),
                        created_at: order.created_at,
                    });
                }
            }
        }
        Ok(sales)
    }

    async fn find_event(&self, id: EventId) -> StoreResult<Option<EventDetails>> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.events.get(&id).map(|e| ledger.event_details(e)))
    }

    async fn list_events(&self) -> StoreResult<Vec<EventDetails>> {
        let ledger = self.ledger.lock().await;
        let mut events: Vec<EventDetails> = ledger
            .events
            .values()
            .map(|e| ledger.event_details(e))
            .collect();
        events.sort_by_key(|d| d.event.starts_at);
        Ok(events)
    }

    async fn reservations_for_account(&self, account: AccountId) -> StoreResult<Vec<Reservation>> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .reservations
            .iter()
            .rev()
            .filter(|r| r.account_id == account)
            .cloned()
            .collect())
    }
}

/// Transaction over an [`InMemoryLedgerStore`].
///
/// Holds the store lock for its whole lifetime.
#[derive(Debug)]
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Ledger>,
    working: Ledger,
    fail_commit: Arc<AtomicBool>,
}

impl InMemoryTx {
    fn account_mut(&mut self, id: AccountId) -> StoreResult<&mut Account> {
        self.working
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::Integrity(format!("account {id} does not exist")))
    }

    fn listing_mut(&mut self, id: ListingId) -> StoreResult<&mut Listing> {
        self.working
            .listings
            .get_mut(&id)
            .ok_or_else(|| StoreError::Integrity(format!("listing {id} does not exist")))
    }
}

impl LedgerTx for InMemoryTx {
    async fn lock_accounts(&mut self, ids: &[AccountId]) -> StoreResult<Vec<Account>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.accounts.get(id).cloned())
            .collect())
    }

    async fn set_balance(&mut self, id: AccountId, balance: Tokens) -> StoreResult<()> {
        self.account_mut(id)?.balance = balance;
        Ok(())
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        if self.working.accounts.contains_key(&account.id) {
            return Err(StoreError::Integrity(format!(
                "account {} already exists",
                account.id
            )));
        }
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn lock_listings(&mut self, ids: &[ListingId]) -> StoreResult<Vec<Listing>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.listings.get(id).cloned())
            .collect())
    }

    async fn set_stock(&mut self, id: ListingId, stock: u32) -> StoreResult<()> {
        self.listing_mut(id)?.stock = stock;
        Ok(())
    }

    async fn insert_listing(&mut self, listing: &Listing) -> StoreResult<()> {
        if !self.working.accounts.contains_key(&listing.seller_id) {
            return Err(StoreError::Integrity(format!(
                "seller {} does not exist",
                listing.seller_id
            )));
        }
        self.working.listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn update_listing(&mut self, listing: &Listing) -> StoreResult<()> {
        *self.listing_mut(listing.id)? = listing.clone();
        Ok(())
    }

    async fn lock_order(&mut self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.working.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        self.working.orders.push(order.clone());
        Ok(())
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let order = self
            .working
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::Integrity(format!("order {id} does not exist")))?;
        order.status = status;
        Ok(())
    }

    async fn review_exists(&mut self, order_id: OrderId) -> StoreResult<bool> {
        Ok(self.working.reviews.iter().any(|r| r.order_id == order_id))
    }

    async fn insert_review(&mut self, review: &Review) -> StoreResult<()> {
        if self.working.reviews.iter().any(|r| r.order_id == review.order_id) {
            return Err(StoreError::Integrity(format!(
                "order {} already has a review",
                review.order_id
            )));
        }
        self.working.reviews.push(review.clone());
        Ok(())
    }

    async fn insert_event(
        &mut self,
        event: &Event,
        categories: &[TicketCategory],
    ) -> StoreResult<()> {
        self.working.events.insert(event.id, event.clone());
        for category in categories {
            self.working.categories.insert(category.id, category.clone());
        }
        Ok(())
    }

    async fn lock_category(
        &mut self,
        id: TicketCategoryId,
    ) -> StoreResult<Option<(Event, TicketCategory)>> {
        let Some(category) = self.working.categories.get(&id) else {
            return Ok(None);
        };
        let event = self
            .working
            .events
            .get(&category.event_id)
            .ok_or_else(|| StoreError::Integrity(format!("category {id} has no event")))?;
        Ok(Some((event.clone(), category.clone())))
    }

    async fn count_reservations(&mut self, event_id: EventId) -> StoreResult<u32> {
        Ok(self.working.reserved(event_id))
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        if self
            .working
            .reservations
            .iter()
            .any(|r| r.code == reservation.code)
        {
            return Err(StoreError::Integrity(format!(
                "ticket code {} already issued",
                reservation.code
            )));
        }
        self.working.reservations.push(reservation.clone());
        Ok(())
    }

    async fn commit(mut self) -> StoreResult<()> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Transaction(
                "injected commit failure".to_string(),
            ));
        }
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
