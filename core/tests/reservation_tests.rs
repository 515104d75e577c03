//! Reservation coordinator tests against the in-memory Ledger Store.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect/panic

use growhub_core::notifier::Notification;
use growhub_core::{CommerceError, Principal, TicketCategoryId, Tokens};
use growhub_testing::{fixtures, test_commerce};
use std::sync::Arc;

#[tokio::test]
async fn test_reservation_debits_and_issues_a_code() {
    let (store, commerce, notifier) = test_commerce();
    let member = fixtures::seed_account(&store, "member", 50).await;
    let event = fixtures::seed_event(&store, 10, &[15, 40]).await;
    let standard = &event.categories[0];

    let receipt = commerce
        .reservations
        .reserve(&Principal::member(member.id), standard.id)
        .await
        .unwrap();

    assert_eq!(receipt.tokens, Tokens::new(35));
    assert_eq!(receipt.reservation.price, Tokens::new(15));
    assert_eq!(receipt.reservation.event_id, event.event.id);
    assert!(receipt.reservation.code.starts_with("TKT-"));

    let ledger = store.snapshot().await;
    assert_eq!(ledger.balance(member.id), Tokens::new(35));
    assert_eq!(ledger.reservations.len(), 1);

    let notes = notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert!(matches!(&notes[0], Notification::TicketReserved { code, .. } if *code == receipt.reservation.code));

    let mine = commerce
        .reservations
        .my_reservations(&Principal::member(member.id))
        .await
        .unwrap();
    assert_eq!(mine, vec![receipt.reservation]);
}

#[tokio::test]
async fn test_capacity_counts_every_category() {
    let (store, commerce, _) = test_commerce();
    let a = fixtures::seed_account(&store, "a", 100).await;
    let b = fixtures::seed_account(&store, "b", 100).await;
    let c = fixtures::seed_account(&store, "c", 100).await;
    let event = fixtures::seed_event(&store, 2, &[10, 20]).await;

    commerce
        .reservations
        .reserve(&Principal::member(a.id), event.categories[0].id)
        .await
        .unwrap();
    commerce
        .reservations
        .reserve(&Principal::member(b.id), event.categories[1].id)
        .await
        .unwrap();

    let err = commerce
        .reservations
        .reserve(&Principal::member(c.id), event.categories[0].id)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CommerceError::EventFull {
            event_id: event.event.id,
            capacity: 2
        }
    );
    assert_eq!(store.snapshot().await.balance(c.id), Tokens::new(100));
}

#[tokio::test]
async fn test_insufficient_balance_leaves_no_reservation() {
    let (store, commerce, _) = test_commerce();
    let member = fixtures::seed_account(&store, "member", 5).await;
    let event = fixtures::seed_event(&store, 10, &[15]).await;

    let err = commerce
        .reservations
        .reserve(&Principal::member(member.id), event.categories[0].id)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CommerceError::InsufficientBalance {
            shortfall: Tokens::new(10)
        }
    );
    let ledger = store.snapshot().await;
    assert!(ledger.reservations.is_empty());
    assert_eq!(ledger.balance(member.id), Tokens::new(5));
}

#[tokio::test]
async fn test_unknown_category_is_not_found() {
    let (store, commerce, _) = test_commerce();
    let member = fixtures::seed_account(&store, "member", 5).await;

    let err = commerce
        .reservations
        .reserve(&Principal::member(member.id), TicketCategoryId::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "NotFound");
}

#[tokio::test]
async fn test_free_tier_reserves_without_tokens() {
    let (store, commerce, _) = test_commerce();
    let member = fixtures::seed_account(&store, "member", 0).await;
    let event = fixtures::seed_event(&store, 1, &[0]).await;

    let receipt = commerce
        .reservations
        .reserve(&Principal::member(member.id), event.categories[0].id)
        .await
        .unwrap();

    assert_eq!(receipt.tokens, Tokens::ZERO);
}

#[tokio::test]
async fn test_same_member_gets_distinct_codes() {
    let (store, commerce, _) = test_commerce();
    let member = fixtures::seed_account(&store, "member", 100).await;
    let event = fixtures::seed_event(&store, 5, &[1]).await;
    let principal = Principal::member(member.id);

    let first = commerce
        .reservations
        .reserve(&principal, event.categories[0].id)
        .await
        .unwrap();
    let second = commerce
        .reservations
        .reserve(&principal, event.categories[0].id)
        .await
        .unwrap();

    assert_ne!(first.reservation.code, second.reservation.code);
    assert_eq!(second.tokens, Tokens::new(98));
}

/// Two members race for the last slot: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_slot_race_has_exactly_one_winner() {
    println!("🧪 Two concurrent reservations for the last slot");

    let (store, commerce, _) = test_commerce();
    let commerce = Arc::new(commerce);
    let event = fixtures::seed_event(&store, 1, &[10]).await;
    let category = event.categories[0].id;

    let mut handles = Vec::new();
    for i in 0..2 {
        let member = fixtures::seed_account(&store, &format!("member-{i}"), 50).await;
        let commerce = Arc::clone(&commerce);
        handles.push(tokio::spawn(async move {
            commerce
                .reservations
                .reserve(&Principal::member(member.id), category)
                .await
        }));
    }

    let mut wins = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(CommerceError::EventFull { .. }) => full += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    println!("  ✅ wins={wins} full={full}");
    assert_eq!(wins, 1);
    assert_eq!(full, 1);
    assert_eq!(store.snapshot().await.reservations.len(), 1);
}

/// Fifty members race for ten slots across two categories.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_exceed_capacity() {
    let (store, commerce, _) = test_commerce();
    let commerce = Arc::new(commerce);
    let event = fixtures::seed_event(&store, 10, &[1, 2]).await;

    let mut handles = Vec::new();
    for i in 0..50 {
        let member = fixtures::seed_account(&store, &format!("member-{i}"), 5).await;
        let commerce = Arc::clone(&commerce);
        let category = event.categories[i % 2].id;
        handles.push(tokio::spawn(async move {
            commerce
                .reservations
                .reserve(&Principal::member(member.id), category)
                .await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }

    let details = commerce.events.get_event(event.event.id).await.unwrap();
    assert_eq!(wins, 10);
    assert_eq!(details.reserved, 10);
    assert_eq!(details.remaining(), 0);
}
