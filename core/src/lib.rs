//! # GrowHub Core
//!
//! Domain model and transactional commerce core for the GrowHub cultivation club.
//!
//! Members hold token balances. They spend them on listings sold by other members
//! and on ticket categories of club events. This crate owns the rules that keep
//! those balances honest:
//!
//! - **Validator**: pure checks of a cart against a listing snapshot
//! - **Checkout**: debit, credit sellers, decrement stock, create the order, all in one transaction
//! - **Reservation**: capacity check, debit, ticket code, all in one transaction
//! - **Review**: one rating per delivered order
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   Principal + request   ┌────────────────────┐
//! │  web (axum)  │ ──────────────────────▶ │   Coordinators     │
//! └──────────────┘                         │  (this crate)      │
//!                                          └─────────┬──────────┘
//!                                                    │ LedgerStore / LedgerTx
//!                                     ┌──────────────┴──────────────┐
//!                                     ▼                             ▼
//!                           PostgresLedgerStore            InMemoryLedgerStore
//!                           (growhub-postgres)             (growhub-testing)
//! ```
//!
//! Every coordinator receives its store handle at construction. Nothing in this
//! crate keeps balances or stock between calls: each operation re-reads the
//! committed state inside the transaction it mutates.

pub mod accounts;
pub mod checkout;
pub mod commerce;
pub mod error;
pub mod event_catalog;
pub mod fulfillment;
pub mod listings;
pub mod metrics;
pub mod notifier;
pub mod policy;
pub mod reservation;
pub mod review;
pub mod store;
pub mod types;
pub mod validator;

pub use commerce::Commerce;
pub use error::{CommerceError, StoreError};
pub use notifier::{Notification, Notifier, TracingNotifier};
pub use store::{LedgerStore, LedgerTx};
pub use types::*;

/// Result type for commerce operations.
pub type Result<T> = std::result::Result<T, CommerceError>;

/// Environment abstractions injected into coordinators.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Production code uses [`SystemClock`]; tests use a fixed clock so that
    /// timestamps and ticket codes are reproducible.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
