//! Error types for the commerce core.
//!
//! [`CommerceError`] is the typed failure every coordinator returns. Its
//! variants are the rejection kinds callers render to users; the single
//! [`CommerceError::Store`] variant carries unexpected durable-store faults,
//! which are reported as a generic internal error.

use crate::types::{EventId, ListingId, OrderId, Tokens};
use thiserror::Error;

/// Failures raised by a Ledger Store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection, query or driver failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored data violates a domain invariant (bad enum text, missing
    /// referenced row, duplicate ticket code, value out of range).
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The store's transaction primitive failed to begin or commit.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

/// Comprehensive error taxonomy for commerce operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    // ═══════════════════════════════════════════════════════════
    // Caller errors
    // ═══════════════════════════════════════════════════════════

    /// No authenticated principal accompanied the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// Referenced listing, event, category, order or account does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller lacks rights over the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed input (bad rating, empty cart, zero quantity, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // Business rule rejections
    // ═══════════════════════════════════════════════════════════

    /// Buyer is the seller of a cart line.
    #[error("Listing {listing_id} belongs to the buyer")]
    SelfPurchaseForbidden {
        /// Offending listing
        listing_id: ListingId,
    },

    /// Requested quantity exceeds stock.
    #[error("Listing {listing_id} has {available} in stock, {requested} requested")]
    InsufficientStock {
        /// Offending listing
        listing_id: ListingId,
        /// Units requested
        requested: u32,
        /// Units available
        available: u32,
    },

    /// Price exceeds the buyer's balance.
    #[error("Insufficient balance: short by {shortfall}")]
    InsufficientBalance {
        /// Missing amount
        shortfall: Tokens,
    },

    /// Reservation would exceed event capacity.
    #[error("Event {event_id} is full ({capacity} reserved)")]
    EventFull {
        /// The event
        event_id: EventId,
        /// Its capacity
        capacity: u32,
    },

    /// Order or listing is not in the state the operation requires.
    #[error("{resource} {id} is {actual}, operation requires {expected}")]
    InvalidState {
        /// Kind of resource
        resource: &'static str,
        /// The order or listing
        id: String,
        /// Required state
        expected: String,
        /// Current state
        actual: String,
    },

    /// A review already exists for this order.
    #[error("Order {order_id} has already been reviewed")]
    AlreadyReviewed {
        /// The order
        order_id: OrderId,
    },

    // ═══════════════════════════════════════════════════════════
    // System errors
    // ═══════════════════════════════════════════════════════════

    /// Unexpected durable-store failure. Nothing was committed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommerceError {
    /// Construct a `NotFound`.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Construct an `InvalidState`.
    #[must_use]
    pub fn invalid_state(
        resource: &'static str,
        id: impl ToString,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::InvalidState {
            resource,
            id: id.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Stable kind name, used as the `error` field of HTTP bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::NotFound { .. } => "NotFound",
            Self::Forbidden(_) => "Forbidden",
            Self::Validation(_) => "ValidationError",
            Self::SelfPurchaseForbidden { .. } => "SelfPurchaseForbidden",
            Self::InsufficientStock { .. } => "InsufficientStock",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::EventFull { .. } => "EventFull",
            Self::InvalidState { .. } => "InvalidState",
            Self::AlreadyReviewed { .. } => "AlreadyReviewed",
            Self::Store(_) => "InternalError",
        }
    }

    /// Returns `true` for typed rejections the caller can act on, `false`
    /// for internal faults.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
