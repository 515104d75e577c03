//! Fixture builders that seed an [`InMemoryLedgerStore`] directly.
//!
//! Timestamps come from [`test_clock`](crate::test_clock) so fixtures line up
//! with coordinators built by [`test_commerce`](crate::test_commerce).

use crate::InMemoryLedgerStore;
use crate::mocks::test_clock;
use chrono::Duration;
use growhub_core::environment::Clock;
use growhub_core::{
    Account, AccountId, Event, EventDetails, EventId, Listing, ListingId, ListingState, Role,
    TicketCategory, TicketCategoryId, Tokens,
};

/// Seed a member account holding `balance` tokens.
pub async fn seed_account(store: &InMemoryLedgerStore, name: &str, balance: u64) -> Account {
    seed_account_with_role(store, name, balance, Role::Member).await
}

/// Seed a staff account holding no tokens.
pub async fn seed_staff(store: &InMemoryLedgerStore, name: &str) -> Account {
    seed_account_with_role(store, name, 0, Role::Staff).await
}

async fn seed_account_with_role(
    store: &InMemoryLedgerStore,
    name: &str,
    balance: u64,
    role: Role,
) -> Account {
    let account = Account {
        id: AccountId::new(),
        display_name: name.to_string(),
        balance: Tokens::new(balance),
        role,
        created_at: test_clock().now(),
    };
    let seeded = account.clone();
    store
        .seed(move |ledger| {
            ledger.accounts.insert(seeded.id, seeded);
        })
        .await;
    account
}

/// Seed an active listing sold by `seller`.
pub async fn seed_listing(
    store: &InMemoryLedgerStore,
    seller: AccountId,
    price: u64,
    stock: u32,
) -> Listing {
    let now = test_clock().now();
    let listing = Listing {
        id: ListingId::new(),
        seller_id: seller,
        title: format!("Grow kit priced {price}"),
        description: "Seeded listing".to_string(),
        price: Tokens::new(price),
        stock,
        state: ListingState::Active,
        created_at: now,
        updated_at: now,
    };
    let seeded = listing.clone();
    store
        .seed(move |ledger| {
            ledger.listings.insert(seeded.id, seeded);
        })
        .await;
    listing
}

/// Seed an event one week out with one category per entry of `prices`.
pub async fn seed_event(
    store: &InMemoryLedgerStore,
    capacity: u32,
    prices: &[u64],
) -> EventDetails {
    let now = test_clock().now();
    let event = Event {
        id: EventId::new(),
        title: "Nutrient film workshop".to_string(),
        description: "Seeded event".to_string(),
        starts_at: now + Duration::days(7),
        location: "Greenhouse 2".to_string(),
        capacity,
        created_at: now,
    };
    let categories: Vec<TicketCategory> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| TicketCategory {
            id: TicketCategoryId::new(),
            event_id: event.id,
            name: format!("Tier {}", i + 1),
            price: Tokens::new(*price),
            benefits: String::new(),
        })
        .collect();

    let details = EventDetails {
        event,
        categories,
        reserved: 0,
    };
    let seeded = details.clone();
    store
        .seed(move |ledger| {
            ledger.events.insert(seeded.event.id, seeded.event);
            for category in seeded.categories {
                ledger.categories.insert(category.id, category);
            }
        })
        .await;
    details
}
