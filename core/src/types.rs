//! Domain types for the GrowHub commerce core.
//!
//! Identifiers are UUID newtypes, token amounts are whole numbers wrapped in
//! [`Tokens`], and every entity mirrors one row family of the Ledger Store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a member account
    AccountId
);
entity_id!(
    /// Unique identifier for a marketplace listing
    ListingId
);
entity_id!(
    /// Unique identifier for an order
    OrderId
);
entity_id!(
    /// Unique identifier for an order line item
    OrderItemId
);
entity_id!(
    /// Unique identifier for a review
    ReviewId
);
entity_id!(
    /// Unique identifier for a club event
    EventId
);
entity_id!(
    /// Unique identifier for a ticket category
    TicketCategoryId
);
entity_id!(
    /// Unique identifier for a reservation
    ReservationId
);

// ============================================================================
// Tokens
// ============================================================================

/// An amount of club tokens. Never negative.
///
/// Amounts are capped at [`Tokens::MAX`], the largest balance the ledger
/// persists. Deserialization rejects anything above it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Tokens(u64);

/// A raw amount above [`Tokens::MAX`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0} exceeds the largest token amount the ledger holds")]
pub struct TokensOutOfRange(pub u64);

impl Tokens {
    /// No tokens.
    pub const ZERO: Self = Self(0);

    /// Largest amount a balance, price or total may reach.
    pub const MAX: Self = Self(i64::MAX.unsigned_abs());

    /// Wrap a trusted raw amount. Untrusted input goes through [`Tokens::try_new`].
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Wrap a raw amount, or `None` above [`Tokens::MAX`].
    #[must_use]
    pub const fn try_new(amount: u64) -> Option<Self> {
        if amount <= Self::MAX.0 {
            Some(Self(amount))
        } else {
            None
        }
    }

    /// The raw amount.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `None` above [`Tokens::MAX`].
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Self::try_new(v),
            None => None,
        }
    }

    /// Returns `None` if the result would be negative.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Price times quantity. Returns `None` above [`Tokens::MAX`].
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(quantity)).and_then(Self::try_new)
    }

    /// How far `self` falls short of `required` (zero when it covers it).
    #[must_use]
    pub const fn shortfall(self, required: Self) -> Self {
        Self(required.0.saturating_sub(self.0))
    }
}

impl TryFrom<u64> for Tokens {
    type Error = TokensOutOfRange;

    fn try_from(amount: u64) -> Result<Self, Self::Error> {
        Self::try_new(amount).ok_or(TokensOutOfRange(amount))
    }
}

impl From<Tokens> for u64 {
    fn from(tokens: Tokens) -> Self {
        tokens.0
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens", self.0)
    }
}

// ============================================================================
// Accounts and principals
// ============================================================================

/// Role of a club account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular club member
    #[default]
    Member,
    /// Club staff (event management, token adjustments)
    Staff,
}

impl Role {
    /// Database / header representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Staff => "staff",
        }
    }

    /// Parse from the database / header representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Some(Self::Member),
            "staff" | "admin" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// A member's identity plus token balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID
    pub id: AccountId,
    /// Name shown to other members
    pub display_name: String,
    /// Current token balance
    pub balance: Tokens,
    /// Account role
    pub role: Role,
    /// When the account was opened
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of an operation, supplied by the auth gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Authenticated account
    pub account_id: AccountId,
    /// Role claimed for this request
    pub role: Role,
}

impl Principal {
    /// A member principal.
    #[must_use]
    pub const fn member(account_id: AccountId) -> Self {
        Self {
            account_id,
            role: Role::Member,
        }
    }

    /// A staff principal.
    #[must_use]
    pub const fn staff(account_id: AccountId) -> Self {
        Self {
            account_id,
            role: Role::Staff,
        }
    }

    /// Whether the caller holds the staff role.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self.role, Role::Staff)
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Lifecycle state of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingState {
    /// Purchasable
    #[default]
    Active,
    /// Temporarily hidden by the seller
    Paused,
    /// Withdrawn for good
    Removed,
}

impl ListingState {
    /// Database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Removed => "removed",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// A sellable item owned by one seller account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Listing ID
    pub id: ListingId,
    /// Owning seller
    pub seller_id: AccountId,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Unit price
    pub price: Tokens,
    /// Units in stock
    pub stock: u32,
    /// Lifecycle state
    pub state: ListingState,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last edit time
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Whether buyers can currently purchase this listing.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, ListingState::Active)
    }
}

// ============================================================================
// Orders
// ============================================================================

/// One requested line of a cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Listing to buy
    #[serde(alias = "productId")]
    pub listing_id: ListingId,
    /// Units requested
    pub quantity: u32,
}

impl CartLine {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(listing_id: ListingId, quantity: u32) -> Self {
        Self {
            listing_id,
            quantity,
        }
    }
}

/// Order fulfillment status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Paid, awaiting delivery
    Pending,
    /// Handed over to the buyer; reviewable
    Delivered,
    /// Closed
    Completed,
}

impl OrderStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "delivered" => Some(Self::Delivered),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether `self → next` is a legal fulfillment step.
    #[must_use]
    pub const fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Delivered) | (Self::Delivered, Self::Completed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line of an order. Price and seller are captured at purchase time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Line item ID
    pub id: OrderItemId,
    /// Purchased listing
    pub listing_id: ListingId,
    /// Seller credited for this line
    pub seller_id: AccountId,
    /// Listing title at purchase time
    pub title: String,
    /// Units bought
    pub quantity: u32,
    /// Unit price snapshot
    pub unit_price: Tokens,
}

/// A buyer's atomically priced purchase of one or more listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Buyer account
    pub buyer_id: AccountId,
    /// Line items in cart order
    pub items: Vec<OrderItem>,
    /// Sum of line totals, fixed at creation
    pub total: Tokens,
    /// Fulfillment status
    pub status: OrderStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Distinct sellers of this order, in line order.
    #[must_use]
    pub fn sellers(&self) -> Vec<AccountId> {
        let mut sellers = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !sellers.contains(&item.seller_id) {
                sellers.push(item.seller_id);
            }
        }
        sellers
    }
}

/// A seller's view of one sold line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Order the line belongs to
    pub order_id: OrderId,
    /// Buyer of the order
    pub buyer_id: AccountId,
    /// Current order status
    pub status: OrderStatus,
    /// The sold line
    pub item: OrderItem,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Reviews
// ============================================================================

/// A rating between 1 and 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Validate a raw rating. Out-of-range values are rejected, not clamped.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        u8::try_from(raw)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A buyer's one-time rating of a delivered order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Reviewed order (unique)
    pub order_id: OrderId,
    /// Product of the order's first line
    pub listing_id: ListingId,
    /// Seller of that product
    pub seller_id: AccountId,
    /// The buyer who wrote it
    pub reviewer_id: AccountId,
    /// Rating 1-5
    pub rating: Rating,
    /// Optional free text
    pub comment: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Events and reservations
// ============================================================================

/// A ticketed club event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// When the event takes place
    pub starts_at: DateTime<Utc>,
    /// Venue
    pub location: String,
    /// Maximum reservations across all categories
    pub capacity: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A priced ticket tier of one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCategory {
    /// Category ID
    pub id: TicketCategoryId,
    /// Owning event
    pub event_id: EventId,
    /// Tier name
    pub name: String,
    /// Price per ticket
    pub price: Tokens,
    /// What the tier includes
    pub benefits: String,
}

/// An event with its categories and current reservation count.
///
/// Serializes the event fields flat, alongside `categories`, `reserved` and
/// the derived `remaining`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventDetails {
    /// The event
    #[serde(flatten)]
    pub event: Event,
    /// Ticket categories
    pub categories: Vec<TicketCategory>,
    /// Reservations across all categories
    pub reserved: u32,
}

impl EventDetails {
    /// Slots still available.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.event.capacity.saturating_sub(self.reserved)
    }
}

impl Serialize for EventDetails {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(flatten)]
            event: &'a Event,
            categories: &'a [TicketCategory],
            reserved: u32,
            remaining: u32,
        }

        Wire {
            event: &self.event,
            categories: &self.categories,
            reserved: self.reserved,
            remaining: self.remaining(),
        }
        .serialize(serializer)
    }
}

/// A paid claim on one slot of a ticket category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Reservation ID
    pub id: ReservationId,
    /// Reserving account
    pub account_id: AccountId,
    /// Reserved category
    pub category_id: TicketCategoryId,
    /// Event of that category
    pub event_id: EventId,
    /// Ticket code presented at the door
    pub code: String,
    /// Tokens paid
    pub price: Tokens,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
