//! Reservation Transaction Coordinator.
//!
//! Reserves one slot of a ticket category. Locking the category's event row
//! before counting reservations linearizes every reservation against the
//! same event, so the capacity check and the insert cannot race.

use crate::environment::Clock;
use crate::error::CommerceError;
use crate::metrics;
use crate::notifier::{Notification, Notifier};
use crate::store::{LedgerStore, LedgerTx};
use crate::types::{
    AccountId, Principal, Reservation, ReservationId, TicketCategoryId, Tokens,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use std::sync::Arc;

/// Length of the random suffix of a ticket code.
const CODE_SUFFIX_LEN: usize = 8;

/// Outcome of a successful reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationReceipt {
    /// Caller's balance after the debit
    pub tokens: Tokens,
    /// The new reservation
    pub reservation: Reservation,
}

/// Reserves event tickets.
pub struct ReservationCoordinator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl<S: LedgerStore> ReservationCoordinator<S> {
    /// Create a coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Atomically reserve one ticket of `category_id` for `principal`.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotFound`]: the category does not exist
    /// - [`CommerceError::EventFull`]: the event has no slot left
    /// - [`CommerceError::InsufficientBalance`]: price exceeds the balance
    /// - [`CommerceError::Store`]: unexpected store failure; nothing committed
    #[tracing::instrument(skip_all, fields(account = %principal.account_id, category = %category_id))]
    pub async fn reserve(
        &self,
        principal: &Principal,
        category_id: TicketCategoryId,
    ) -> crate::Result<ReservationReceipt> {
        match self.commit_reservation(principal, category_id).await {
            Ok(receipt) => {
                let reservation = &receipt.reservation;
                metrics::record_reservation_committed(reservation.price);
                tracing::info!(
                    reservation_id = %reservation.id,
                    event_id = %reservation.event_id,
                    balance = receipt.tokens.get(),
                    "Reservation committed"
                );
                self.notifier.notify(Notification::TicketReserved {
                    reservation_id: reservation.id,
                    account_id: reservation.account_id,
                    event_id: reservation.event_id,
                    code: reservation.code.clone(),
                });
                Ok(receipt)
            }
            Err(error) => {
                metrics::record_reservation_rejected(&error);
                if error.is_rejection() {
                    tracing::debug!(kind = error.kind(), %error, "Reservation rejected");
                } else {
                    tracing::error!(%error, "Reservation failed");
                }
                Err(error)
            }
        }
    }

    async fn commit_reservation(
        &self,
        principal: &Principal,
        category_id: TicketCategoryId,
    ) -> crate::Result<ReservationReceipt> {
        let mut tx = self.store.begin().await?;

        let (event, category) = tx
            .lock_category(category_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("TicketCategory", category_id))?;

        let reserved = tx.count_reservations(event.id).await?;
        if reserved >= event.capacity {
            return Err(CommerceError::EventFull {
                event_id: event.id,
                capacity: event.capacity,
            });
        }

        let buyer = tx
            .lock_accounts(&[principal.account_id])
            .await?
            .into_iter()
            .next()
            .ok_or(CommerceError::Unauthenticated)?;

        let balance = buyer.balance.checked_sub(category.price).ok_or_else(|| {
            CommerceError::InsufficientBalance {
                shortfall: buyer.balance.shortfall(category.price),
            }
        })?;
        tx.set_balance(buyer.id, balance).await?;

        let now = self.clock.now();
        let reservation = Reservation {
            id: ReservationId::new(),
            account_id: buyer.id,
            category_id: category.id,
            event_id: event.id,
            code: ticket_code(buyer.id, category.id, now),
            price: category.price,
            created_at: now,
        };
        tx.insert_reservation(&reservation).await?;

        tx.commit().await?;
        Ok(ReservationReceipt {
            tokens: balance,
            reservation,
        })
    }

    /// Reservations held by the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails.
    pub async fn my_reservations(&self, principal: &Principal) -> crate::Result<Vec<Reservation>> {
        Ok(self
            .store
            .reservations_for_account(principal.account_id)
            .await?)
    }
}

/// `TKT-{buyer}-{category}-{unix micros}-{random}`.
///
/// The random suffix keeps two reservations by the same buyer within one
/// clock tick distinct.
fn ticket_code(buyer: AccountId, category: TicketCategoryId, at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!(
        "TKT-{}-{}-{}-{suffix}",
        buyer.as_uuid().simple(),
        category.as_uuid().simple(),
        at.timestamp_micros()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ticket_code_embeds_buyer_category_and_time() {
        let buyer = AccountId::new();
        let category = TicketCategoryId::new();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let code = ticket_code(buyer, category, at);

        assert!(code.starts_with("TKT-"));
        assert!(code.contains(&buyer.as_uuid().simple().to_string()));
        assert!(code.contains(&category.as_uuid().simple().to_string()));
        assert!(code.contains(&at.timestamp_micros().to_string()));
        let suffix = code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), CODE_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ticket_codes_differ_within_one_tick() {
        let buyer = AccountId::new();
        let category = TicketCategoryId::new();
        let at = Utc::now();
        assert_ne!(ticket_code(buyer, category, at), ticket_code(buyer, category, at));
    }
}
