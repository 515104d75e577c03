//! Checkout, order history, reviews and fulfillment.

use crate::{AppError, AppState, Authenticated, CorrelationId};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use growhub_core::validator::Manifest;
use growhub_core::{CartLine, LedgerStore, Order, OrderId, OrderStatus, Review, Sale};
use serde::Deserialize;

/// `POST /orders` body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Cart lines (`productId` is accepted for `listingId`)
    pub items: Vec<CartLine>,
}

/// `POST /orders/:id/review` body.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// 1 to 5
    pub rating: i64,
    /// Optional free text
    #[serde(default)]
    pub comment: Option<String>,
}

/// `POST /orders/:id/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Target status
    pub status: OrderStatus,
}

/// Place an order for the caller's cart.
///
/// `201` with the order, or `400 {error}` naming the rejection.
///
/// # Errors
///
/// See [`AppError::rejection`].
pub async fn checkout<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    CorrelationId(correlation_id): CorrelationId,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request("ValidationError", e.body_text()))?;
    let order = state
        .commerce
        .checkout
        .checkout(&principal, &request.items)
        .await
        .map_err(|err| {
            tracing::info!(%correlation_id, kind = err.kind(), "Checkout request rejected");
            AppError::rejection(err)
        })?;
    tracing::info!(%correlation_id, order_id = %order.id, "Checkout request fulfilled");
    Ok((StatusCode::CREATED, Json(order)))
}

/// Price a cart without committing anything.
///
/// # Errors
///
/// See [`AppError::rejection`].
pub async fn quote<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<Manifest>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request("ValidationError", e.body_text()))?;
    let manifest = state
        .commerce
        .checkout
        .quote(&principal, &request.items)
        .await
        .map_err(AppError::rejection)?;
    Ok(Json(manifest))
}

/// The caller's orders, newest first.
///
/// # Errors
///
/// Returns [`AppError`] on store failure.
pub async fn order_history<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.commerce.checkout.order_history(&principal).await?))
}

/// Lines the caller sold, newest first.
///
/// # Errors
///
/// Returns [`AppError`] on store failure.
pub async fn sales_history<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Sale>>, AppError> {
    Ok(Json(state.commerce.checkout.sales_history(&principal).await?))
}

/// Review a delivered order.
///
/// # Errors
///
/// `404`, `403`, `409` (`InvalidState`, `AlreadyReviewed`) or `422`.
pub async fn create_review<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    path: Result<Path<OrderId>, PathRejection>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Review>, AppError> {
    let Path(order_id) = path?;
    let Json(request) = payload?;
    let review = state
        .commerce
        .reviews
        .create_review(&principal, order_id, request.rating, request.comment.as_deref())
        .await?;
    Ok(Json(review))
}

/// Move an order along `pending → delivered → completed`.
///
/// # Errors
///
/// `404`, `403` or `409`.
pub async fn advance_status<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    path: Result<Path<OrderId>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(order_id) = path?;
    let Json(request) = payload?;
    let order = state
        .commerce
        .fulfillment
        .advance_order(&principal, order_id, request.status)
        .await?;
    Ok(Json(order))
}
