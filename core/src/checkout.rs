//! Checkout Transaction Coordinator.
//!
//! Turns a cart into an order in one Ledger Store transaction:
//!
//! 1. lock the cart's listings, then the buyer and every seller
//! 2. re-run the [`validator`](crate::validator) against those locked rows
//! 3. debit the buyer, credit each seller, decrement stock
//! 4. insert the `Pending` order with its price-captured line items
//! 5. commit, then notify
//!
//! The first failing step drops the transaction, so a rejected checkout leaves
//! balances, stock and orders exactly as they were.

use crate::environment::Clock;
use crate::error::CommerceError;
use crate::metrics;
use crate::notifier::{Notification, Notifier};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{
    Account, AccountId, CartLine, ListingId, Order, OrderId, OrderItem, OrderItemId, OrderStatus,
    Principal, Sale, Tokens,
};
use crate::validator::{self, Manifest};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Places orders and serves order and sales history.
pub struct CheckoutCoordinator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl<S: LedgerStore> CheckoutCoordinator<S> {
    /// Create a coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Atomically purchase `cart` for `principal`.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`]: empty cart or zero quantity
    /// - [`CommerceError::NotFound`]: a listing is missing or not active
    /// - [`CommerceError::InsufficientStock`]: stock does not cover a line
    /// - [`CommerceError::SelfPurchaseForbidden`]: the buyer sells a line
    /// - [`CommerceError::InsufficientBalance`]: total exceeds the balance
    /// - [`CommerceError::Store`]: unexpected store failure; nothing committed
    #[tracing::instrument(
        skip_all,
        fields(buyer = %principal.account_id, lines = cart.len())
    )]
    pub async fn checkout(&self, principal: &Principal, cart: &[CartLine]) -> crate::Result<Order> {
        match self.commit_checkout(principal, cart).await {
            Ok((order, credits)) => {
                metrics::record_checkout_committed(order.total);
                tracing::info!(
                    order_id = %order.id,
                    total = order.total.get(),
                    sellers = credits.len(),
                    "Checkout committed"
                );
                self.notifier.notify(Notification::OrderPlaced {
                    order_id: order.id,
                    buyer_id: order.buyer_id,
                    total: order.total,
                });
                for (seller_id, amount) in credits {
                    self.notifier.notify(Notification::ItemSold {
                        order_id: order.id,
                        seller_id,
                        amount,
                    });
                }
                Ok(order)
            }
            Err(error) => {
                metrics::record_checkout_rejected(&error);
                if error.is_rejection() {
                    tracing::debug!(kind = error.kind(), %error, "Checkout rejected");
                } else {
                    tracing::error!(%error, "Checkout failed");
                }
                Err(error)
            }
        }
    }

    async fn commit_checkout(
        &self,
        principal: &Principal,
        cart: &[CartLine],
    ) -> crate::Result<(Order, BTreeMap<AccountId, Tokens>)> {
        let cart = validator::normalize_cart(cart)?;

        let mut tx = self.store.begin().await?;

        let mut listing_ids: Vec<ListingId> = cart.iter().map(|l| l.listing_id).collect();
        listing_ids.sort_unstable();
        let listings = tx.lock_listings(&listing_ids).await?;

        let mut account_ids: Vec<AccountId> = listings.iter().map(|l| l.seller_id).collect();
        account_ids.push(principal.account_id);
        account_ids.sort_unstable();
        account_ids.dedup();
        let accounts: BTreeMap<AccountId, Account> = tx
            .lock_accounts(&account_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let buyer = accounts
            .get(&principal.account_id)
            .ok_or(CommerceError::Unauthenticated)?;

        let manifest = validator::validate(buyer, &cart, &listings)?;
        let credits = seller_credits(&manifest)?;

        let buyer_balance = buyer
            .balance
            .checked_sub(manifest.total)
            .ok_or_else(|| CommerceError::InsufficientBalance {
                shortfall: buyer.balance.shortfall(manifest.total),
            })?;
        tx.set_balance(buyer.id, buyer_balance).await?;

        for (seller_id, amount) in &credits {
            let seller = accounts
                .get(seller_id)
                .ok_or_else(|| CommerceError::not_found("Account", seller_id))?;
            let balance = seller.balance.checked_add(*amount).ok_or_else(|| {
                CommerceError::Validation(format!("Balance of seller {seller_id} would overflow"))
            })?;
            tx.set_balance(*seller_id, balance).await?;
        }

        for line in &manifest.lines {
            tx.set_stock(line.listing_id, line.remaining_stock).await?;
        }

        let order = Order {
            id: OrderId::new(),
            buyer_id: buyer.id,
            items: manifest
                .lines
                .iter()
                .map(|line| OrderItem {
                    id: OrderItemId::new(),
                    listing_id: line.listing_id,
                    seller_id: line.seller_id,
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
            total: manifest.total,
            status: OrderStatus::Pending,
            created_at: self.clock.now(),
        };
        tx.insert_order(&order).await?;

        tx.commit().await?;
        Ok((order, credits))
    }

    /// Price `cart` against committed state without locking or writing.
    ///
    /// The answer is advisory: [`checkout`](Self::checkout) re-validates
    /// inside its own transaction.
    ///
    /// # Errors
    ///
    /// Returns the same rejections as [`checkout`](Self::checkout).
    pub async fn quote(&self, principal: &Principal, cart: &[CartLine]) -> crate::Result<Manifest> {
        let cart = validator::normalize_cart(cart)?;
        let buyer = self
            .store
            .find_account(principal.account_id)
            .await?
            .ok_or(CommerceError::Unauthenticated)?;

        let mut listings = Vec::with_capacity(cart.len());
        for line in &cart {
            if let Some(listing) = self.store.find_listing(line.listing_id).await? {
                listings.push(listing);
            }
        }

        validator::validate(&buyer, &cart, &listings)
    }

    /// Orders placed by the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails.
    pub async fn order_history(&self, principal: &Principal) -> crate::Result<Vec<Order>> {
        Ok(self.store.orders_for_buyer(principal.account_id).await?)
    }

    /// Lines sold by the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails.
    pub async fn sales_history(&self, principal: &Principal) -> crate::Result<Vec<Sale>> {
        Ok(self.store.sales_for_seller(principal.account_id).await?)
    }
}

/// Sum each seller's line totals.
fn seller_credits(manifest: &Manifest) -> crate::Result<BTreeMap<AccountId, Tokens>> {
    let mut credits: BTreeMap<AccountId, Tokens> = BTreeMap::new();
    for line in &manifest.lines {
        let entry = credits.entry(line.seller_id).or_insert(Tokens::ZERO);
        *entry = entry
            .checked_add(line.line_total)
            .ok_or_else(|| CommerceError::Validation("Order total is too large".to_string()))?;
    }
    Ok(credits)
}
