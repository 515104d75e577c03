//! Account balances: the caller's own view and staff adjustments.

use crate::environment::Clock;
use crate::error::CommerceError;
use crate::metrics;
use crate::policy::{self, Capability};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{Account, AccountId, Principal, Role, Tokens};
use crate::validator::ensure_amount;
use std::sync::Arc;

/// Reads and adjusts token balances.
pub struct AccountService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> AccountService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The caller's account.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Unauthenticated`] if the principal has no account.
    pub async fn account(&self, principal: &Principal) -> crate::Result<Account> {
        self.store
            .find_account(principal.account_id)
            .await?
            .ok_or(CommerceError::Unauthenticated)
    }

    /// Open an account with an opening balance. Staff only.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Forbidden`]: caller is not staff
    /// - [`CommerceError::Validation`]: blank display name, or an opening
    ///   balance above [`Tokens::MAX`]
    #[tracing::instrument(skip_all, fields(by = %principal.account_id))]
    pub async fn open_account(
        &self,
        principal: &Principal,
        display_name: &str,
        role: Role,
        opening_balance: Tokens,
    ) -> crate::Result<Account> {
        policy::authorize(principal, Capability::OpenAccount)?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(CommerceError::Validation(
                "Display name cannot be empty".to_string(),
            ));
        }
        let opening_balance = ensure_amount(opening_balance, "Opening balance")?;

        let account = Account {
            id: AccountId::new(),
            display_name: display_name.to_string(),
            balance: opening_balance,
            role,
            created_at: self.clock.now(),
        };

        let mut tx = self.store.begin().await?;
        tx.insert_account(&account).await?;
        tx.commit().await?;

        tracing::info!(account_id = %account.id, role = role.as_str(), "Account opened");
        Ok(account)
    }

    /// Apply a signed `delta` to `account_id`'s balance. Staff only.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Forbidden`]: caller is not staff
    /// - [`CommerceError::Validation`]: zero delta, blank reason, or a balance
    ///   that would exceed [`Tokens::MAX`]
    /// - [`CommerceError::NotFound`]: no such account
    /// - [`CommerceError::InsufficientBalance`]: the balance would go below zero
    #[tracing::instrument(skip_all, fields(account_id = %account_id, delta = delta, by = %principal.account_id))]
    pub async fn adjust_tokens(
        &self,
        principal: &Principal,
        account_id: AccountId,
        delta: i64,
        reason: &str,
    ) -> crate::Result<Account> {
        policy::authorize(principal, Capability::AdjustTokens)?;

        if delta == 0 {
            return Err(CommerceError::Validation("Delta cannot be zero".to_string()));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CommerceError::Validation(
                "An adjustment needs a reason".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let mut account = tx
            .lock_accounts(&[account_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CommerceError::not_found("Account", account_id))?;

        let balance = apply_delta(account.balance, delta)?;
        tx.set_balance(account_id, balance).await?;
        tx.commit().await?;

        metrics::record_token_adjustment();
        tracing::info!(
            old_balance = account.balance.get(),
            new_balance = balance.get(),
            reason,
            "Balance adjusted"
        );
        account.balance = balance;
        Ok(account)
    }
}

fn apply_delta(balance: Tokens, delta: i64) -> crate::Result<Tokens> {
    let result = i128::from(balance.get()) + i128::from(delta);
    if result < 0 {
        return Err(CommerceError::InsufficientBalance {
            shortfall: Tokens::new(delta.unsigned_abs() - balance.get()),
        });
    }
    u64::try_from(result)
        .ok()
        .and_then(Tokens::try_new)
        .ok_or_else(|| {
            CommerceError::Validation(format!("Balance cannot exceed {}", Tokens::MAX))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn credits_and_debits() {
        assert_eq!(apply_delta(Tokens::new(10), 5).unwrap(), Tokens::new(15));
        assert_eq!(apply_delta(Tokens::new(10), -10).unwrap(), Tokens::ZERO);
    }

    #[test]
    fn overdraft_reports_shortfall() {
        assert_eq!(
            apply_delta(Tokens::new(10), -25).unwrap_err(),
            CommerceError::InsufficientBalance {
                shortfall: Tokens::new(15)
            }
        );
    }

    #[test]
    fn overflow_is_rejected() {
        assert_eq!(
            apply_delta(Tokens::new(u64::MAX), 1).unwrap_err().kind(),
            "ValidationError"
        );
    }

    #[test]
    fn credit_past_ledger_maximum_is_rejected() {
        assert_eq!(apply_delta(Tokens::MAX, 0).unwrap(), Tokens::MAX);
        assert_eq!(
            apply_delta(Tokens::MAX, 1).unwrap_err().kind(),
            "ValidationError"
        );
        assert_eq!(
            apply_delta(Tokens::new(5), i64::MAX).unwrap_err().kind(),
            "ValidationError"
        );
    }
}
