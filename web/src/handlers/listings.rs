//! Listing catalog ("products").

use crate::{AppError, AppState, Authenticated};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use growhub_core::listings::{ListingUpdate, NewListing};
use growhub_core::{LedgerStore, Listing, ListingId};

/// Active listings, oldest first.
///
/// # Errors
///
/// Returns [`AppError`] on store failure.
pub async fn list_products<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.commerce.listings.list_active().await?))
}

/// One listing in any state.
///
/// # Errors
///
/// `404` if it does not exist.
pub async fn get_product<S: LedgerStore>(
    State(state): State<AppState<S>>,
    path: Result<Path<ListingId>, PathRejection>,
) -> Result<Json<Listing>, AppError> {
    let Path(listing_id) = path?;
    Ok(Json(state.commerce.listings.get(listing_id).await?))
}

/// List a new item for sale by the caller.
///
/// # Errors
///
/// `401` for an unknown caller, `422` for invalid input.
pub async fn create_product<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    let Json(new_listing) = payload?;
    let listing = state
        .commerce
        .listings
        .create_listing(&principal, &new_listing)
        .await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Edit price, stock, text or state.
///
/// # Errors
///
/// `404`, `403`, `409` for a removed listing, `422` for invalid input.
pub async fn update_product<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    path: Result<Path<ListingId>, PathRejection>,
    payload: Result<Json<ListingUpdate>, JsonRejection>,
) -> Result<Json<Listing>, AppError> {
    let Path(listing_id) = path?;
    let Json(update) = payload?;
    let listing = state
        .commerce
        .listings
        .update_listing(&principal, listing_id, &update)
        .await?;
    Ok(Json(listing))
}
