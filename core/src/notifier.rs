//! Post-commit notifications.
//!
//! Coordinators hand a [`Notification`] to their [`Notifier`] only after the
//! transaction has committed. `notify` returns nothing: a notifier that fails
//! must swallow and log its own error, so the commit it reports on is never
//! affected.

use crate::types::{AccountId, EventId, ListingId, OrderId, ReservationId, Tokens};
use serde::Serialize;

/// Something members may want to hear about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    /// A buyer's checkout committed.
    OrderPlaced {
        /// New order
        order_id: OrderId,
        /// Buyer
        buyer_id: AccountId,
        /// Amount debited
        total: Tokens,
    },
    /// One seller was credited by a checkout.
    ItemSold {
        /// Order that credited the seller
        order_id: OrderId,
        /// Credited seller
        seller_id: AccountId,
        /// Sum of that seller's lines
        amount: Tokens,
    },
    /// A ticket was reserved.
    TicketReserved {
        /// New reservation
        reservation_id: ReservationId,
        /// Reserving account
        account_id: AccountId,
        /// Event
        event_id: EventId,
        /// Ticket code
        code: String,
    },
    /// An active listing became cheaper.
    PriceDropped {
        /// Listing
        listing_id: ListingId,
        /// Previous price
        old_price: Tokens,
        /// New price
        new_price: Tokens,
    },
}

/// Fire-and-forget sink for [`Notification`]s.
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Must not block for long and must not panic.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::OrderPlaced {
                order_id,
                buyer_id,
                total,
            } => tracing::info!(%order_id, %buyer_id, total = total.get(), "Order placed"),
            Notification::ItemSold {
                order_id,
                seller_id,
                amount,
            } => tracing::info!(%order_id, %seller_id, amount = amount.get(), "Item sold"),
            Notification::TicketReserved {
                reservation_id,
                account_id,
                event_id,
                code,
            } => tracing::info!(%reservation_id, %account_id, %event_id, code, "Ticket reserved"),
            Notification::PriceDropped {
                listing_id,
                old_price,
                new_price,
            } => tracing::info!(
                %listing_id,
                old_price = old_price.get(),
                new_price = new_price.get(),
                "Price dropped"
            ),
        }
    }
}
