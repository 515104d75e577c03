//! Review workflow and order fulfillment tests.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use growhub_core::{
    Account, CartLine, Commerce, CommerceError, Order, OrderId, OrderStatus, Principal,
};
use growhub_testing::{InMemoryLedgerStore, fixtures, test_commerce};
use std::sync::Arc;

struct Placed {
    store: Arc<InMemoryLedgerStore>,
    commerce: Commerce<InMemoryLedgerStore>,
    buyer: Account,
    seller: Account,
    order: Order,
}

/// A buyer's pending order for one unit from one seller.
async fn placed_order() -> Placed {
    let (store, commerce, _) = test_commerce();
    let seller = fixtures::seed_account(&store, "seller", 0).await;
    let buyer = fixtures::seed_account(&store, "buyer", 100).await;
    let listing = fixtures::seed_listing(&store, seller.id, 10, 5).await;
    let order = commerce
        .checkout
        .checkout(&Principal::member(buyer.id), &[CartLine::new(listing.id, 1)])
        .await
        .unwrap();
    Placed {
        store,
        commerce,
        buyer,
        seller,
        order,
    }
}

async fn deliver(p: &Placed) {
    p.commerce
        .fulfillment
        .advance_order(&Principal::member(p.seller.id), p.order.id, OrderStatus::Delivered)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reviewing_a_pending_order_is_invalid_state() {
    let p = placed_order().await;

    let err = p
        .commerce
        .reviews
        .create_review(&Principal::member(p.buyer.id), p.order.id, 5, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "InvalidState");
    assert!(p.store.snapshot().await.reviews.is_empty());
}

#[tokio::test]
async fn test_review_of_delivered_order_rates_first_line_seller() {
    let p = placed_order().await;
    deliver(&p).await;

    let review = p
        .commerce
        .reviews
        .create_review(
            &Principal::member(p.buyer.id),
            p.order.id,
            4,
            Some("Healthy roots"),
        )
        .await
        .unwrap();

    assert_eq!(review.rating.get(), 4);
    assert_eq!(review.seller_id, p.seller.id);
    assert_eq!(review.listing_id, p.order.items[0].listing_id);
    assert_eq!(review.comment.as_deref(), Some("Healthy roots"));
}

#[tokio::test]
async fn test_second_review_is_already_reviewed_and_changes_nothing() {
    let p = placed_order().await;
    deliver(&p).await;
    let buyer = Principal::member(p.buyer.id);

    let first = p
        .commerce
        .reviews
        .create_review(&buyer, p.order.id, 5, None)
        .await
        .unwrap();
    let err = p
        .commerce
        .reviews
        .create_review(&buyer, p.order.id, 1, Some("changed my mind"))
        .await
        .unwrap_err();

    assert_eq!(err, CommerceError::AlreadyReviewed { order_id: p.order.id });
    let reviews = p.store.snapshot().await.reviews;
    assert_eq!(reviews, vec![first]);
}

#[tokio::test]
async fn test_only_the_buyer_may_review() {
    let p = placed_order().await;
    deliver(&p).await;

    let err = p
        .commerce
        .reviews
        .create_review(&Principal::member(p.seller.id), p.order.id, 5, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "Forbidden");
}

#[tokio::test]
async fn test_out_of_range_rating_is_a_validation_error() {
    let p = placed_order().await;
    deliver(&p).await;
    let buyer = Principal::member(p.buyer.id);

    for rating in [0, 6, -3] {
        let err = p
            .commerce
            .reviews
            .create_review(&buyer, p.order.id, rating, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }
    assert!(p.store.snapshot().await.reviews.is_empty());
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let p = placed_order().await;
    let err = p
        .commerce
        .reviews
        .create_review(&Principal::member(p.buyer.id), OrderId::new(), 3, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");
}

#[tokio::test]
async fn test_fulfillment_follows_pending_delivered_completed() {
    let p = placed_order().await;
    let buyer = Principal::member(p.buyer.id);
    let seller = Principal::member(p.seller.id);

    // buyer cannot mark delivered
    let err = p
        .commerce
        .fulfillment
        .advance_order(&buyer, p.order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Forbidden");

    // skipping delivery is not a transition
    let err = p
        .commerce
        .fulfillment
        .advance_order(&Principal::staff(p.seller.id), p.order.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidState");

    let delivered = p
        .commerce
        .fulfillment
        .advance_order(&seller, p.order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let completed = p
        .commerce
        .fulfillment
        .advance_order(&buyer, p.order.id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);

    let err = p
        .commerce
        .fulfillment
        .advance_order(&Principal::staff(p.seller.id), p.order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidState");

    // a completed order can no longer be reviewed
    let err = p
        .commerce
        .reviews
        .create_review(&buyer, p.order.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidState");
}
