//! Business metrics for the commerce core.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `growhub_checkouts_total{status}` - Checkouts by outcome (`committed` or the rejection kind)
//! - `growhub_reservations_total{status}` - Reservations by outcome
//! - `growhub_tokens_spent_total{channel}` - Tokens debited by checkouts and reservations
//! - `growhub_reviews_total` - Reviews created
//! - `growhub_token_adjustments_total` - Staff balance adjustments
//! - `growhub_listings_created_total` - Listings created
//! - `growhub_events_created_total` - Events created
//!
//! Recording is a no-op until an exporter is installed, so the coordinators
//! record unconditionally.

use crate::error::CommerceError;
use crate::types::Tokens;
use metrics::describe_counter;

/// Register descriptions for every commerce metric.
///
/// Call once at startup, after the exporter is installed.
pub fn register_commerce_metrics() {
    describe_counter!(
        "growhub_checkouts_total",
        "Checkouts by outcome (committed or rejection kind)"
    );
    describe_counter!(
        "growhub_reservations_total",
        "Event reservations by outcome (committed or rejection kind)"
    );
    describe_counter!(
        "growhub_tokens_spent_total",
        "Tokens debited from buyers, by channel (checkout, reservation)"
    );
    describe_counter!("growhub_reviews_total", "Reviews created");
    describe_counter!(
        "growhub_token_adjustments_total",
        "Staff token adjustments applied"
    );
    describe_counter!("growhub_listings_created_total", "Listings created");
    describe_counter!("growhub_events_created_total", "Events created");

    tracing::info!("Commerce metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a committed checkout.
pub fn record_checkout_committed(total: Tokens) {
    metrics::counter!("growhub_checkouts_total", "status" => "committed").increment(1);
    metrics::counter!("growhub_tokens_spent_total", "channel" => "checkout").increment(total.get());
    tracing::debug!(total = total.get(), "Recorded checkout_committed metric");
}

/// Record a checkout that did not commit.
pub fn record_checkout_rejected(error: &CommerceError) {
    metrics::counter!("growhub_checkouts_total", "status" => error.kind()).increment(1);
}

/// Record a committed reservation.
pub fn record_reservation_committed(price: Tokens) {
    metrics::counter!("growhub_reservations_total", "status" => "committed").increment(1);
    metrics::counter!("growhub_tokens_spent_total", "channel" => "reservation")
        .increment(price.get());
    tracing::debug!(price = price.get(), "Recorded reservation_committed metric");
}

/// Record a reservation that did not commit.
pub fn record_reservation_rejected(error: &CommerceError) {
    metrics::counter!("growhub_reservations_total", "status" => error.kind()).increment(1);
}

/// Record a created review.
pub fn record_review_created() {
    metrics::counter!("growhub_reviews_total").increment(1);
}

/// Record a staff balance adjustment.
pub fn record_token_adjustment() {
    metrics::counter!("growhub_token_adjustments_total").increment(1);
}

/// Record a created listing.
pub fn record_listing_created() {
    metrics::counter!("growhub_listings_created_total").increment(1);
}

/// Record a created event.
pub fn record_event_created() {
    metrics::counter!("growhub_events_created_total").increment(1);
}
