//! Event catalog and ticket reservations.

use crate::{AppError, AppState, Authenticated, CorrelationId};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use growhub_core::event_catalog::NewEvent;
use growhub_core::reservation::ReservationReceipt;
use growhub_core::{EventDetails, EventId, LedgerStore, Reservation, TicketCategoryId};
use serde::Deserialize;

/// `POST /events/reserve` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    /// Category to reserve a slot of
    pub category_id: TicketCategoryId,
}

/// All events with categories and reservation counts.
///
/// # Errors
///
/// Returns [`AppError`] on store failure.
pub async fn list_events<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<EventDetails>>, AppError> {
    Ok(Json(state.commerce.events.list_events().await?))
}

/// One event.
///
/// # Errors
///
/// `404` if it does not exist.
pub async fn get_event<S: LedgerStore>(
    State(state): State<AppState<S>>,
    path: Result<Path<EventId>, PathRejection>,
) -> Result<Json<EventDetails>, AppError> {
    let Path(event_id) = path?;
    Ok(Json(state.commerce.events.get_event(event_id).await?))
}

/// Publish an event. Staff only.
///
/// # Errors
///
/// `403` for members, `422` for invalid input.
pub async fn create_event<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<EventDetails>), AppError> {
    let Json(new_event) = payload?;
    let created = state.commerce.events.create_event(&principal, &new_event).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Reserve one ticket.
///
/// `200 {tokens, reservation}`, or `400 {error}` naming the rejection.
///
/// # Errors
///
/// See [`AppError::rejection`].
pub async fn reserve<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    CorrelationId(correlation_id): CorrelationId,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<Json<ReservationReceipt>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request("ValidationError", e.body_text()))?;
    let receipt = state
        .commerce
        .reservations
        .reserve(&principal, request.category_id)
        .await
        .map_err(|err| {
            tracing::info!(%correlation_id, kind = err.kind(), "Reservation request rejected");
            AppError::rejection(err)
        })?;
    tracing::info!(
        %correlation_id,
        reservation_id = %receipt.reservation.id,
        "Reservation request fulfilled"
    );
    Ok(Json(receipt))
}

/// The caller's reservations, newest first.
///
/// # Errors
///
/// Returns [`AppError`] on store failure.
pub async fn my_reservations<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.commerce.reservations.my_reservations(&principal).await?))
}
