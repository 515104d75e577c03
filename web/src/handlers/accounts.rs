//! The caller's account and staff account administration.

use crate::{AppError, AppState, Authenticated};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use growhub_core::{Account, AccountId, LedgerStore, Role, Tokens};
use serde::Deserialize;

/// `POST /admin/accounts` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountRequest {
    /// Name shown to other members
    pub display_name: String,
    /// Defaults to `member`
    #[serde(default)]
    pub role: Role,
    /// Defaults to zero
    #[serde(default)]
    pub opening_balance: Tokens,
}

/// `POST /admin/accounts/:id/tokens` body.
#[derive(Debug, Deserialize)]
pub struct AdjustTokensRequest {
    /// Signed change to the balance
    pub delta: i64,
    /// Why, for the audit log
    pub reason: String,
}

/// The caller's account.
///
/// # Errors
///
/// `401` if the caller has no account.
pub async fn me<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Account>, AppError> {
    Ok(Json(state.commerce.accounts.account(&principal).await?))
}

/// Open an account. Staff only.
///
/// # Errors
///
/// `403` for members, `422` for invalid input.
pub async fn open_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<OpenAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let Json(request) = payload?;
    let account = state
        .commerce
        .accounts
        .open_account(
            &principal,
            &request.display_name,
            request.role,
            request.opening_balance,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Credit or debit an account. Staff only.
///
/// # Errors
///
/// `403`, `404`, `422`, or `400 InsufficientBalance` if the balance would go negative.
pub async fn adjust_tokens<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    path: Result<Path<AccountId>, PathRejection>,
    payload: Result<Json<AdjustTokensRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let Path(account_id) = path?;
    let Json(request) = payload?;
    let account = state
        .commerce
        .accounts
        .adjust_tokens(&principal, account_id, request.delta, &request.reason)
        .await?;
    Ok(Json(account))
}
