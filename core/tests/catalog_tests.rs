//! Listing catalog, account and event catalog tests.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use chrono::{Duration, Utc};
use growhub_core::event_catalog::{NewEvent, NewTicketCategory};
use growhub_core::listings::{ListingUpdate, NewListing};
use growhub_core::notifier::Notification;
use growhub_core::{AccountId, CartLine, ListingState, Principal, Role, Tokens};
use growhub_testing::{fixtures, test_commerce};

fn kit(price: u64, stock: u32) -> NewListing {
    NewListing {
        title: "  Deep water culture kit ".to_string(),
        description: "Bucket, air stone, net pots".to_string(),
        price: Tokens::new(price),
        stock,
    }
}

#[tokio::test]
async fn test_created_listing_is_active_and_purchasable() {
    let (store, commerce, _) = test_commerce();
    let seller = fixtures::seed_account(&store, "seller", 0).await;
    let buyer = fixtures::seed_account(&store, "buyer", 100).await;

    let listing = commerce
        .listings
        .create_listing(&Principal::member(seller.id), &kit(25, 2))
        .await
        .unwrap();

    assert_eq!(listing.title, "Deep water culture kit");
    assert_eq!(listing.state, ListingState::Active);
    assert_eq!(listing.seller_id, seller.id);
    assert_eq!(commerce.listings.list_active().await.unwrap(), vec![listing.clone()]);

    commerce
        .checkout
        .checkout(&Principal::member(buyer.id), &[CartLine::new(listing.id, 2)])
        .await
        .unwrap();
    assert_eq!(commerce.listings.get(listing.id).await.unwrap().stock, 0);
}

#[tokio::test]
async fn test_blank_title_is_rejected() {
    let (store, commerce, _) = test_commerce();
    let seller = fixtures::seed_account(&store, "seller", 0).await;
    let mut blank = kit(1, 1);
    blank.title = "   ".to_string();

    let err = commerce
        .listings
        .create_listing(&Principal::member(seller.id), &blank)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ValidationError");
}

#[tokio::test]
async fn test_only_the_seller_edits_and_price_drops_notify() {
    let (store, commerce, notifier) = test_commerce();
    let seller = fixtures::seed_account(&store, "seller", 0).await;
    let other = fixtures::seed_account(&store, "other", 0).await;
    let listing = fixtures::seed_listing(&store, seller.id, 40, 3).await;
    let cheaper = ListingUpdate {
        price: Some(Tokens::new(30)),
        ..ListingUpdate::default()
    };

    let err = commerce
        .listings
        .update_listing(&Principal::member(other.id), listing.id, &cheaper)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Forbidden");
    assert!(notifier.notifications().is_empty());

    let updated = commerce
        .listings
        .update_listing(&Principal::member(seller.id), listing.id, &cheaper)
        .await
        .unwrap();
    assert_eq!(updated.price, Tokens::new(30));
    assert_eq!(
        notifier.notifications(),
        vec![Notification::PriceDropped {
            listing_id: listing.id,
            old_price: Tokens::new(40),
            new_price: Tokens::new(30),
        }]
    );

    // a price rise is silent
    let dearer = ListingUpdate {
        price: Some(Tokens::new(50)),
        ..ListingUpdate::default()
    };
    commerce
        .listings
        .update_listing(&Principal::member(seller.id), listing.id, &dearer)
        .await
        .unwrap();
    assert_eq!(notifier.notifications().len(), 1);
}

#[tokio::test]
async fn test_paused_listing_cannot_be_bought_and_removed_is_terminal() {
    let (store, commerce, _) = test_commerce();
    let seller = fixtures::seed_account(&store, "seller", 0).await;
    let buyer = fixtures::seed_account(&store, "buyer", 100).await;
    let listing = fixtures::seed_listing(&store, seller.id, 10, 3).await;
    let principal = Principal::member(seller.id);
    let set_state = |state| ListingUpdate {
        state: Some(state),
        ..ListingUpdate::default()
    };

    commerce
        .listings
        .update_listing(&principal, listing.id, &set_state(ListingState::Paused))
        .await
        .unwrap();
    let err = commerce
        .checkout
        .checkout(&Principal::member(buyer.id), &[CartLine::new(listing.id, 1)])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");
    assert!(commerce.listings.list_active().await.unwrap().is_empty());

    commerce
        .listings
        .update_listing(&principal, listing.id, &set_state(ListingState::Removed))
        .await
        .unwrap();
    let err = commerce
        .listings
        .update_listing(&principal, listing.id, &set_state(ListingState::Active))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidState");
}

#[tokio::test]
async fn test_staff_adjusts_balances_but_never_below_zero() {
    let (store, commerce, _) = test_commerce();
    let staff = fixtures::seed_staff(&store, "treasurer").await;
    let member = fixtures::seed_account(&store, "member", 10).await;
    let staff = Principal::staff(staff.id);

    let credited = commerce
        .accounts
        .adjust_tokens(&staff, member.id, 15, "harvest festival prize")
        .await
        .unwrap();
    assert_eq!(credited.balance, Tokens::new(25));

    let err = commerce
        .accounts
        .adjust_tokens(&staff, member.id, -30, "correction")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InsufficientBalance");
    assert_eq!(store.snapshot().await.balance(member.id), Tokens::new(25));

    let err = commerce
        .accounts
        .adjust_tokens(&Principal::member(member.id), member.id, 100, "self service")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Forbidden");

    let err = commerce
        .accounts
        .adjust_tokens(&staff, AccountId::new(), 1, "ghost")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");
}

#[tokio::test]
async fn test_staff_opens_accounts_members_read_their_own() {
    let (store, commerce, _) = test_commerce();
    let staff = fixtures::seed_staff(&store, "secretary").await;

    let opened = commerce
        .accounts
        .open_account(&Principal::staff(staff.id), "New member", Role::Member, Tokens::new(20))
        .await
        .unwrap();

    let me = commerce
        .accounts
        .account(&Principal::member(opened.id))
        .await
        .unwrap();
    assert_eq!(me, opened);

    let err = commerce
        .accounts
        .open_account(&Principal::member(opened.id), "Sneaky", Role::Staff, Tokens::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Forbidden");

    let err = commerce
        .accounts
        .account(&Principal::member(AccountId::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Unauthenticated");
}

fn workshop(capacity: u32, categories: Vec<NewTicketCategory>) -> NewEvent {
    NewEvent {
        title: "Aeroponics night".to_string(),
        description: "Misting rigs".to_string(),
        starts_at: Utc::now() + Duration::days(14),
        location: "Club house".to_string(),
        capacity,
        categories,
    }
}

fn tier(name: &str, price: u64) -> NewTicketCategory {
    NewTicketCategory {
        name: name.to_string(),
        price: Tokens::new(price),
        benefits: String::new(),
    }
}

#[tokio::test]
async fn test_staff_create_events_that_members_can_reserve() {
    let (store, commerce, _) = test_commerce();
    let staff = fixtures::seed_staff(&store, "organizer").await;
    let member = fixtures::seed_account(&store, "member", 30).await;

    let created = commerce
        .events
        .create_event(
            &Principal::staff(staff.id),
            &workshop(3, vec![tier("Standard", 10), tier("Supporter", 25)]),
        )
        .await
        .unwrap();
    assert_eq!(created.categories.len(), 2);
    assert_eq!(created.remaining(), 3);

    commerce
        .reservations
        .reserve(&Principal::member(member.id), created.categories[1].id)
        .await
        .unwrap();

    let listed = commerce.events.list_events().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].reserved, 1);
    assert_eq!(listed[0].remaining(), 2);
}

#[tokio::test]
async fn test_event_validation() {
    let (store, commerce, _) = test_commerce();
    let staff = Principal::staff(fixtures::seed_staff(&store, "organizer").await.id);

    let err = commerce
        .events
        .create_event(&staff, &workshop(0, vec![tier("Standard", 10)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    let err = commerce
        .events
        .create_event(&staff, &workshop(5, vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    let member = fixtures::seed_account(&store, "member", 0).await;
    let err = commerce
        .events
        .create_event(&Principal::member(member.id), &workshop(5, vec![tier("Standard", 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Forbidden");
}

#[tokio::test]
async fn test_amounts_above_the_ledger_maximum_are_validation_errors() {
    let (store, commerce, _) = test_commerce();
    let seller = fixtures::seed_account(&store, "seller", 0).await;
    let staff = Principal::staff(fixtures::seed_staff(&store, "treasurer").await.id);
    let listing = fixtures::seed_listing(&store, seller.id, 10, 1).await;
    let too_much = Tokens::new(Tokens::MAX.get() + 1);

    let err = commerce
        .listings
        .create_listing(&Principal::member(seller.id), &kit(too_much.get(), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    let err = commerce
        .listings
        .update_listing(
            &Principal::member(seller.id),
            listing.id,
            &ListingUpdate {
                price: Some(too_much),
                ..ListingUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    let err = commerce
        .events
        .create_event(&staff, &workshop(5, vec![tier("Gold", too_much.get())]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    let err = commerce
        .accounts
        .open_account(&staff, "Whale", Role::Member, too_much)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    commerce
        .accounts
        .adjust_tokens(&staff, seller.id, i64::MAX, "top up")
        .await
        .unwrap();
    let err = commerce
        .accounts
        .adjust_tokens(&staff, seller.id, 1, "one more")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    let ledger = store.snapshot().await;
    assert_eq!(ledger.listings.len(), 1);
    assert_eq!(ledger.listings[&listing.id].price, Tokens::new(10));
    assert!(ledger.events.is_empty());
    assert_eq!(ledger.accounts.len(), 2);
    assert_eq!(ledger.balance(seller.id), Tokens::MAX);
}
