//! Pricing and stock validation.
//!
//! Pure functions over a snapshot: given the buyer's account, the requested
//! cart and the listings it references, decide whether the cart can be
//! fulfilled and price it. Nothing here writes. The checkout coordinator runs
//! [`validate`] against rows it has locked, so the manifest it gets back is
//! still true when it commits.
//!
//! Checks run in a fixed order, each over the whole cart:
//!
//! 1. every listing exists and is active, else `NotFound`
//! 2. every line is covered by stock, else `InsufficientStock`
//! 3. no line is sold by the buyer, else `SelfPurchaseForbidden`
//! 4. the total is covered by the balance, else `InsufficientBalance`

use crate::error::CommerceError;
use crate::types::{Account, AccountId, CartLine, Listing, ListingId, Tokens};
use serde::Serialize;
use std::collections::HashMap;

/// Upper bound on distinct lines in one cart.
pub const MAX_CART_LINES: usize = 100;

/// One priced line of a validated cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestLine {
    /// Listing bought
    pub listing_id: ListingId,
    /// Seller to credit
    pub seller_id: AccountId,
    /// Listing title at validation time
    pub title: String,
    /// Units bought
    pub quantity: u32,
    /// Captured unit price
    pub unit_price: Tokens,
    /// `unit_price × quantity`
    pub line_total: Tokens,
    /// Stock left after this line is fulfilled
    pub remaining_stock: u32,
}

/// Itemized result of a successful validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Lines in cart order
    pub lines: Vec<ManifestLine>,
    /// Sum of line totals
    pub total: Tokens,
}

/// Reject an amount above [`Tokens::MAX`], naming it `what`.
///
/// # Errors
///
/// Returns [`CommerceError::Validation`] when the ledger cannot hold `amount`.
pub fn ensure_amount(amount: Tokens, what: &str) -> Result<Tokens, CommerceError> {
    Tokens::try_new(amount.get())
        .ok_or_else(|| CommerceError::Validation(format!("{what} cannot exceed {}", Tokens::MAX)))
}

/// Reject empty carts and zero quantities, and merge repeated listings.
///
/// Lines keep the order in which each listing first appears.
///
/// # Errors
///
/// Returns [`CommerceError::Validation`] for an empty or oversized cart, a
/// zero quantity, or a merged quantity that overflows.
pub fn normalize_cart(cart: &[CartLine]) -> Result<Vec<CartLine>, CommerceError> {
    if cart.is_empty() {
        return Err(CommerceError::Validation("Cart is empty".to_string()));
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(cart.len());
    for line in cart {
        if line.quantity == 0 {
            return Err(CommerceError::Validation(format!(
                "Quantity for listing {} must be at least 1",
                line.listing_id
            )));
        }
        if let Some(existing) = merged.iter_mut().find(|l| l.listing_id == line.listing_id) {
            existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                CommerceError::Validation(format!("Quantity for listing {} is too large", line.listing_id))
            })?;
        } else {
            merged.push(*line);
        }
    }

    if merged.len() > MAX_CART_LINES {
        return Err(CommerceError::Validation(format!(
            "Cart cannot hold more than {MAX_CART_LINES} listings"
        )));
    }

    Ok(merged)
}

/// Validate a normalized cart against a listing snapshot and price it.
///
/// # Errors
///
/// Returns the first failing check, in the order documented at module level.
pub fn validate(
    buyer: &Account,
    cart: &[CartLine],
    listings: &[Listing],
) -> Result<Manifest, CommerceError> {
    let by_id: HashMap<ListingId, &Listing> = listings.iter().map(|l| (l.id, l)).collect();

    // (a) existence
    let mut resolved = Vec::with_capacity(cart.len());
    for line in cart {
        match by_id.get(&line.listing_id) {
            Some(listing) if listing.is_active() => resolved.push((line, *listing)),
            _ => return Err(CommerceError::not_found("Listing", line.listing_id)),
        }
    }

    // (b) stock
    for (line, listing) in &resolved {
        if listing.stock < line.quantity {
            return Err(CommerceError::InsufficientStock {
                listing_id: listing.id,
                requested: line.quantity,
                available: listing.stock,
            });
        }
    }

    // (c) self purchase
    if let Some((_, listing)) = resolved.iter().find(|(_, l)| l.seller_id == buyer.id) {
        return Err(CommerceError::SelfPurchaseForbidden {
            listing_id: listing.id,
        });
    }

    // (d) balance
    let mut lines = Vec::with_capacity(resolved.len());
    let mut total = Tokens::ZERO;
    for (line, listing) in resolved {
        let line_total = listing
            .price
            .checked_mul(line.quantity)
            .ok_or_else(|| CommerceError::Validation("Order total is too large".to_string()))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| CommerceError::Validation("Order total is too large".to_string()))?;
        lines.push(ManifestLine {
            listing_id: listing.id,
            seller_id: listing.seller_id,
            title: listing.title.clone(),
            quantity: line.quantity,
            unit_price: listing.price,
            line_total,
            remaining_stock: listing.stock - line.quantity,
        });
    }

    if buyer.balance < total {
        return Err(CommerceError::InsufficientBalance {
            shortfall: buyer.balance.shortfall(total),
        });
    }

    Ok(Manifest { lines, total })
}
