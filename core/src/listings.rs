//! Listing catalog: sellers create and edit listings, buyers browse them.

use crate::environment::Clock;
use crate::error::CommerceError;
use crate::metrics;
use crate::notifier::{Notification, Notifier};
use crate::policy::{self, Capability};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{Listing, ListingId, ListingState, Principal, Tokens};
use crate::validator::ensure_amount;
use serde::Deserialize;
use std::sync::Arc;

/// Longest accepted listing title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Fields of a new listing.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: Tokens,
    /// Initial stock
    pub stock: u32,
}

/// Partial edit of a listing. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New unit price
    pub price: Option<Tokens>,
    /// New stock level
    pub stock: Option<u32>,
    /// New lifecycle state
    pub state: Option<ListingState>,
}

/// Manages listings.
pub struct ListingService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl<S: LedgerStore> ListingService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Publish a new active listing owned by the caller.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`]: blank or oversized title, or a price
    ///   above [`Tokens::MAX`]
    /// - [`CommerceError::Unauthenticated`]: caller has no account
    #[tracing::instrument(skip_all, fields(seller = %principal.account_id))]
    pub async fn create_listing(
        &self,
        principal: &Principal,
        new: &NewListing,
    ) -> crate::Result<Listing> {
        let title = validate_title(&new.title)?;
        let price = ensure_amount(new.price, "Price")?;

        let mut tx = self.store.begin().await?;
        if tx.lock_accounts(&[principal.account_id]).await?.is_empty() {
            return Err(CommerceError::Unauthenticated);
        }

        let now = self.clock.now();
        let listing = Listing {
            id: ListingId::new(),
            seller_id: principal.account_id,
            title,
            description: new.description.trim().to_string(),
            price,
            stock: new.stock,
            state: ListingState::Active,
            created_at: now,
            updated_at: now,
        };
        tx.insert_listing(&listing).await?;
        tx.commit().await?;

        metrics::record_listing_created();
        tracing::info!(listing_id = %listing.id, price = listing.price.get(), "Listing created");
        Ok(listing)
    }

    /// Edit a listing. Only its seller or staff may do so.
    ///
    /// Lowering the price of an active listing raises a
    /// [`Notification::PriceDropped`] after commit.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotFound`]: no such listing
    /// - [`CommerceError::Forbidden`]: caller does not own the listing
    /// - [`CommerceError::InvalidState`]: the listing was removed
    /// - [`CommerceError::Validation`]: blank or oversized title, or a price
    ///   above [`Tokens::MAX`]
    #[tracing::instrument(skip_all, fields(listing_id = %listing_id))]
    pub async fn update_listing(
        &self,
        principal: &Principal,
        listing_id: ListingId,
        update: &ListingUpdate,
    ) -> crate::Result<Listing> {
        let mut tx = self.store.begin().await?;

        let current = tx
            .lock_listings(&[listing_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CommerceError::not_found("Listing", listing_id))?;

        policy::authorize(
            principal,
            Capability::ManageListing {
                seller: current.seller_id,
            },
        )?;

        if current.state == ListingState::Removed {
            return Err(CommerceError::invalid_state(
                "Listing",
                listing_id,
                "active or paused",
                current.state.as_str(),
            ));
        }

        let mut updated = current.clone();
        if let Some(title) = &update.title {
            updated.title = validate_title(title)?;
        }
        if let Some(description) = &update.description {
            updated.description = description.trim().to_string();
        }
        if let Some(price) = update.price {
            updated.price = ensure_amount(price, "Price")?;
        }
        if let Some(stock) = update.stock {
            updated.stock = stock;
        }
        if let Some(state) = update.state {
            updated.state = state;
        }
        updated.updated_at = self.clock.now();

        tx.update_listing(&updated).await?;
        tx.commit().await?;

        tracing::info!(state = updated.state.as_str(), "Listing updated");
        if updated.is_active() && updated.price < current.price {
            self.notifier.notify(Notification::PriceDropped {
                listing_id,
                old_price: current.price,
                new_price: updated.price,
            });
        }
        Ok(updated)
    }

    /// A listing in any state.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if it does not exist.
    pub async fn get(&self, listing_id: ListingId) -> crate::Result<Listing> {
        self.store
            .find_listing(listing_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Listing", listing_id))
    }

    /// All purchasable listings.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails.
    pub async fn list_active(&self) -> crate::Result<Vec<Listing>> {
        Ok(self.store.active_listings().await?)
    }
}

fn validate_title(title: &str) -> crate::Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CommerceError::Validation("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CommerceError::Validation(format!(
            "Title cannot exceed {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}
