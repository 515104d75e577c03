//! Review Workflow.
//!
//! A buyer may rate a `Delivered` order once. The review is attributed to the
//! listing and seller of the order's first line item; other sellers of a
//! multi-seller order are not rated.

use crate::environment::Clock;
use crate::error::{CommerceError, StoreError};
use crate::metrics;
use crate::policy::{self, Capability};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{OrderId, OrderStatus, Principal, Rating, Review, ReviewId};
use std::sync::Arc;

/// Longest accepted review comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2_000;

/// Creates reviews.
pub struct ReviewWorkflow<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> ReviewWorkflow<S> {
    /// Create a workflow over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Rate `order_id` on behalf of its buyer.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`]: rating outside 1-5 or oversized comment
    /// - [`CommerceError::NotFound`]: no such order
    /// - [`CommerceError::Forbidden`]: caller is not the buyer
    /// - [`CommerceError::InvalidState`]: order is not `Delivered`
    /// - [`CommerceError::AlreadyReviewed`]: the order already has a review
    #[tracing::instrument(skip_all, fields(order_id = %order_id, reviewer = %principal.account_id))]
    pub async fn create_review(
        &self,
        principal: &Principal,
        order_id: OrderId,
        rating: i64,
        comment: Option<&str>,
    ) -> crate::Result<Review> {
        let rating = Rating::new(rating).ok_or_else(|| {
            CommerceError::Validation(format!(
                "Rating must be between {} and {}",
                Rating::MIN,
                Rating::MAX
            ))
        })?;
        let comment = normalize_comment(comment)?;

        let mut tx = self.store.begin().await?;

        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Order", order_id))?;

        policy::authorize(principal, Capability::ReviewOrder { buyer: order.buyer_id })?;

        if order.status != OrderStatus::Delivered {
            return Err(CommerceError::invalid_state(
                "Order",
                order_id,
                OrderStatus::Delivered,
                order.status,
            ));
        }

        if tx.review_exists(order_id).await? {
            return Err(CommerceError::AlreadyReviewed { order_id });
        }

        let first = order.items.first().ok_or_else(|| {
            CommerceError::Store(StoreError::Integrity(format!(
                "Order {order_id} has no line items"
            )))
        })?;

        let review = Review {
            id: ReviewId::new(),
            order_id,
            listing_id: first.listing_id,
            seller_id: first.seller_id,
            reviewer_id: principal.account_id,
            rating,
            comment,
            created_at: self.clock.now(),
        };
        tx.insert_review(&review).await?;
        tx.commit().await?;

        metrics::record_review_created();
        tracing::info!(review_id = %review.id, rating = rating.get(), "Review created");
        Ok(review)
    }
}

fn normalize_comment(comment: Option<&str>) -> crate::Result<Option<String>> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(CommerceError::Validation(format!(
            "Comment cannot exceed {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn blank_comments_become_none() {
        assert_eq!(normalize_comment(None).unwrap(), None);
        assert_eq!(normalize_comment(Some("   ")).unwrap(), None);
        assert_eq!(
            normalize_comment(Some("  crisp leaves ")).unwrap(),
            Some("crisp leaves".to_string())
        );
    }

    #[test]
    fn oversized_comment_is_rejected() {
        let long = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert_eq!(
            normalize_comment(Some(&long)).unwrap_err().kind(),
            "ValidationError"
        );
    }
}
