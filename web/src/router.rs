//! Route table.

use crate::handlers::{accounts, events, health, listings, orders};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use growhub_core::LedgerStore;
use tower_http::trace::TraceLayer;

/// Build the REST router over `state`.
///
/// ```text
/// GET    /health                       liveness
/// GET    /ready                        readiness (pings the store)
/// GET    /me                           caller's account
/// POST   /admin/accounts               open an account (staff)
/// POST   /admin/accounts/:id/tokens    adjust a balance (staff)
/// GET    /products                     active listings
/// POST   /products                     create a listing
/// GET    /products/:id                 one listing
/// PATCH  /products/:id                 edit a listing
/// POST   /orders                       checkout
/// GET    /orders                       caller's orders
/// POST   /orders/quote                 price a cart without buying
/// GET    /orders/sales                 caller's sales
/// POST   /orders/:id/review            review a delivered order
/// POST   /orders/:id/status            advance fulfillment
/// GET    /events                       events with availability
/// POST   /events                       publish an event (staff)
/// POST   /events/reserve               reserve a ticket
/// GET    /events/my-reservations       caller's reservations
/// GET    /events/:id                   one event
/// ```
pub fn build_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness::<S>))
        .route("/me", get(accounts::me::<S>))
        .route("/admin/accounts", post(accounts::open_account::<S>))
        .route("/admin/accounts/:id/tokens", post(accounts::adjust_tokens::<S>))
        .route(
            "/products",
            get(listings::list_products::<S>).post(listings::create_product::<S>),
        )
        .route(
            "/products/:id",
            get(listings::get_product::<S>).patch(listings::update_product::<S>),
        )
        .route(
            "/orders",
            get(orders::order_history::<S>).post(orders::checkout::<S>),
        )
        .route("/orders/quote", post(orders::quote::<S>))
        .route("/orders/sales", get(orders::sales_history::<S>))
        .route("/orders/:id/review", post(orders::create_review::<S>))
        .route("/orders/:id/status", post(orders::advance_status::<S>))
        .route(
            "/events",
            get(events::list_events::<S>).post(events::create_event::<S>),
        )
        .route("/events/reserve", post(events::reserve::<S>))
        .route("/events/my-reservations", get(events::my_reservations::<S>))
        .route("/events/:id", get(events::get_event::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
