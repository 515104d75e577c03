//! Order status progression: `Pending → Delivered → Completed`.

use crate::error::CommerceError;
use crate::policy::{self, Capability};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{Order, OrderId, OrderStatus, Principal};
use std::sync::Arc;

/// Advances orders through fulfillment.
pub struct FulfillmentService<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> FulfillmentService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Move `order_id` to `target`.
    ///
    /// A seller of the order (or staff) marks it `Delivered`; the buyer (or
    /// staff) marks a delivered order `Completed`.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotFound`]: no such order
    /// - [`CommerceError::Forbidden`]: caller may not make this transition
    /// - [`CommerceError::InvalidState`]: `target` does not follow the current status
    #[tracing::instrument(skip_all, fields(order_id = %order_id, target = %target))]
    pub async fn advance_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
        target: OrderStatus,
    ) -> crate::Result<Order> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Order", order_id))?;

        let sellers = order.sellers();
        policy::authorize(
            principal,
            Capability::AdvanceOrder {
                buyer: order.buyer_id,
                sellers: &sellers,
                target,
            },
        )?;

        if !order.status.can_advance_to(target) {
            return Err(CommerceError::invalid_state(
                "Order",
                order_id,
                expected_before(target),
                order.status,
            ));
        }

        tx.set_order_status(order_id, target).await?;
        tx.commit().await?;

        tracing::info!(from = %order.status, "Order advanced");
        order.status = target;
        Ok(order)
    }
}

const fn expected_before(target: OrderStatus) -> &'static str {
    match target {
        OrderStatus::Delivered => "pending",
        OrderStatus::Completed => "delivered",
        OrderStatus::Pending => "none (orders are created pending)",
    }
}
