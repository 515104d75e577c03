//! Event catalog: staff publish events with ticket categories.

use crate::environment::Clock;
use crate::error::CommerceError;
use crate::metrics;
use crate::policy::{self, Capability};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{
    Event, EventDetails, EventId, Principal, TicketCategory, TicketCategoryId, Tokens,
};
use crate::validator::ensure_amount;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// A ticket tier of a new event.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicketCategory {
    /// Tier name
    pub name: String,
    /// Price per ticket
    pub price: Tokens,
    /// What the tier includes
    #[serde(default)]
    pub benefits: String,
}

/// Fields of a new event.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// When it takes place
    pub starts_at: DateTime<Utc>,
    /// Venue
    pub location: String,
    /// Maximum reservations across all categories
    pub capacity: u32,
    /// Ticket tiers, at least one
    pub categories: Vec<NewTicketCategory>,
}

/// Publishes and lists events.
pub struct EventCatalog<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> EventCatalog<S> {
    /// Create a catalog over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Publish an event. Staff only.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Forbidden`]: caller is not staff
    /// - [`CommerceError::Validation`]: blank title, zero capacity, no
    ///   categories, a blank category name, or a price above [`Tokens::MAX`]
    #[tracing::instrument(skip_all, fields(title = %new.title, capacity = new.capacity))]
    pub async fn create_event(
        &self,
        principal: &Principal,
        new: &NewEvent,
    ) -> crate::Result<EventDetails> {
        policy::authorize(principal, Capability::ManageEvents)?;

        let title = new.title.trim();
        if title.is_empty() {
            return Err(CommerceError::Validation("Title cannot be empty".to_string()));
        }
        if new.capacity == 0 {
            return Err(CommerceError::Validation(
                "Capacity must be greater than zero".to_string(),
            ));
        }
        if new.categories.is_empty() {
            return Err(CommerceError::Validation(
                "An event needs at least one ticket category".to_string(),
            ));
        }
        if new.categories.iter().any(|c| c.name.trim().is_empty()) {
            return Err(CommerceError::Validation(
                "Ticket category names cannot be empty".to_string(),
            ));
        }
        for category in &new.categories {
            ensure_amount(category.price, "Ticket price")?;
        }

        let event = Event {
            id: EventId::new(),
            title: title.to_string(),
            description: new.description.trim().to_string(),
            starts_at: new.starts_at,
            location: new.location.trim().to_string(),
            capacity: new.capacity,
            created_at: self.clock.now(),
        };
        let categories: Vec<TicketCategory> = new
            .categories
            .iter()
            .map(|c| TicketCategory {
                id: TicketCategoryId::new(),
                event_id: event.id,
                name: c.name.trim().to_string(),
                price: c.price,
                benefits: c.benefits.trim().to_string(),
            })
            .collect();

        let mut tx = self.store.begin().await?;
        tx.insert_event(&event, &categories).await?;
        tx.commit().await?;

        metrics::record_event_created();
        tracing::info!(event_id = %event.id, categories = categories.len(), "Event created");
        Ok(EventDetails {
            event,
            categories,
            reserved: 0,
        })
    }

    /// All events, soonest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails.
    pub async fn list_events(&self) -> crate::Result<Vec<EventDetails>> {
        Ok(self.store.list_events().await?)
    }

    /// One event with its categories and reservation count.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if it does not exist.
    pub async fn get_event(&self, event_id: EventId) -> crate::Result<EventDetails> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("Event", event_id))
    }
}
