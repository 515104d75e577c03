//! The [`Commerce`] facade wires every coordinator to one store.

use crate::accounts::AccountService;
use crate::checkout::CheckoutCoordinator;
use crate::environment::Clock;
use crate::event_catalog::EventCatalog;
use crate::fulfillment::FulfillmentService;
use crate::listings::ListingService;
use crate::notifier::Notifier;
use crate::reservation::ReservationCoordinator;
use crate::review::ReviewWorkflow;
use crate::store::LedgerStore;
use std::sync::Arc;

/// All commerce services over a shared Ledger Store handle.
pub struct Commerce<S> {
    store: Arc<S>,
    /// Cart checkout and order history
    pub checkout: CheckoutCoordinator<S>,
    /// Event ticket reservations
    pub reservations: ReservationCoordinator<S>,
    /// Order reviews
    pub reviews: ReviewWorkflow<S>,
    /// Order status progression
    pub fulfillment: FulfillmentService<S>,
    /// Listing catalog
    pub listings: ListingService<S>,
    /// Balances and staff adjustments
    pub accounts: AccountService<S>,
    /// Event catalog
    pub events: EventCatalog<S>,
}

impl<S: LedgerStore> Commerce<S> {
    /// Build every service over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            checkout: CheckoutCoordinator::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&notifier),
            ),
            reservations: ReservationCoordinator::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&notifier),
            ),
            reviews: ReviewWorkflow::new(Arc::clone(&store), Arc::clone(&clock)),
            fulfillment: FulfillmentService::new(Arc::clone(&store)),
            listings: ListingService::new(Arc::clone(&store), Arc::clone(&clock), notifier),
            accounts: AccountService::new(Arc::clone(&store), Arc::clone(&clock)),
            events: EventCatalog::new(Arc::clone(&store), clock),
            store,
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }
}
