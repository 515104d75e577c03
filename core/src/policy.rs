//! Capability-based authorization.
//!
//! Every coordinator describes the action it is about to take as a
//! [`Capability`] and asks [`authorize`] once, before touching the store's
//! write path. The predicate is pure: it sees only the principal and the
//! capability, never the store.

use crate::error::CommerceError;
use crate::types::{AccountId, OrderStatus, Principal};

/// An action on a resource, carrying the ownership facts needed to judge it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capability<'a> {
    /// Edit a listing owned by `seller`.
    ManageListing {
        /// Listing owner
        seller: AccountId,
    },
    /// Review an order placed by `buyer`.
    ReviewOrder {
        /// Order buyer
        buyer: AccountId,
    },
    /// Move an order to `target`.
    AdvanceOrder {
        /// Order buyer
        buyer: AccountId,
        /// Sellers of the order's lines
        sellers: &'a [AccountId],
        /// Requested status
        target: OrderStatus,
    },
    /// Credit or debit any account.
    AdjustTokens,
    /// Open a new account.
    OpenAccount,
    /// Create events.
    ManageEvents,
}

/// Decide whether `principal` may exercise `capability`.
///
/// # Errors
///
/// Returns [`CommerceError::Forbidden`] when the principal lacks the right.
pub fn authorize(principal: &Principal, capability: Capability<'_>) -> Result<(), CommerceError> {
    let allowed = match &capability {
        Capability::ManageListing { seller } => {
            principal.account_id == *seller || principal.is_staff()
        }
        Capability::ReviewOrder { buyer } => principal.account_id == *buyer,
        Capability::AdvanceOrder {
            buyer,
            sellers,
            target,
        } => {
            principal.is_staff()
                || match target {
                    OrderStatus::Delivered => sellers.contains(&principal.account_id),
                    OrderStatus::Completed => principal.account_id == *buyer,
                    OrderStatus::Pending => false,
                }
        }
        Capability::AdjustTokens | Capability::OpenAccount | Capability::ManageEvents => {
            principal.is_staff()
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(CommerceError::Forbidden(denial_reason(&capability).to_string()))
    }
}

const fn denial_reason(capability: &Capability<'_>) -> &'static str {
    match capability {
        Capability::ManageListing { .. } => "only the seller may edit this listing",
        Capability::ReviewOrder { .. } => "only the buyer may review this order",
        Capability::AdvanceOrder {
            target: OrderStatus::Delivered,
            ..
        } => "only a seller of this order may mark it delivered",
        Capability::AdvanceOrder { .. } => "only the buyer may complete this order",
        Capability::AdjustTokens => "staff role required to adjust balances",
        Capability::OpenAccount => "staff role required to open accounts",
        Capability::ManageEvents => "staff role required to manage events",
    }
}
