//! # GrowHub Testing
//!
//! Testing utilities for the GrowHub commerce core.
//!
//! This crate provides:
//! - [`InMemoryLedgerStore`]: a serializable, in-process Ledger Store
//! - Mock implementations of environment traits ([`FixedClock`], [`RecordingNotifier`])
//! - Fixture builders that seed accounts, listings and events
//!
//! ## Example
//!
//! ```
//! use growhub_testing::{InMemoryLedgerStore, fixtures, test_commerce};
//! use growhub_core::{CartLine, Principal};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (store, commerce, _notifier) = test_commerce();
//! let seller = fixtures::seed_account(&store, "seller", 0).await;
//! let buyer = fixtures::seed_account(&store, "buyer", 100).await;
//! let listing = fixtures::seed_listing(&store, seller.id, 30, 5).await;
//!
//! let order = commerce
//!     .checkout
//!     .checkout(&Principal::member(buyer.id), &[CartLine::new(listing.id, 2)])
//!     .await
//!     .unwrap();
//! assert_eq!(order.total.get(), 60);
//! # }
//! ```

pub mod fixtures;
pub mod ledger;

use chrono::{DateTime, Utc};
use growhub_core::Commerce;
use growhub_core::environment::Clock;
use growhub_core::notifier::{Notification, Notifier};
use std::sync::{Arc, Mutex};

pub use ledger::{InMemoryLedgerStore, Ledger};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Arc, Clock, DateTime, Mutex, Notification, Notifier, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use growhub_testing::mocks::FixedClock;
    /// use growhub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }

    /// Notifier that keeps every notification for later assertions.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        received: Arc<Mutex<Vec<Notification>>>,
    }

    impl RecordingNotifier {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything notified so far, in order
        #[must_use]
        pub fn notifications(&self) -> Vec<Notification> {
            self.received
                .lock()
                .map(|n| n.clone())
                .unwrap_or_default()
        }

        /// Forget everything notified so far
        pub fn clear(&self) {
            if let Ok(mut received) = self.received.lock() {
                received.clear();
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            if let Ok(mut received) = self.received.lock() {
                received.push(notification);
            }
        }
    }
}

pub use mocks::{FixedClock, RecordingNotifier, test_clock};

/// A [`Commerce`] over a fresh [`InMemoryLedgerStore`], with the test clock
/// and a recording notifier.
#[must_use]
pub fn test_commerce() -> (
    Arc<InMemoryLedgerStore>,
    Commerce<InMemoryLedgerStore>,
    RecordingNotifier,
) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let notifier = RecordingNotifier::new();
    let commerce = Commerce::new(
        Arc::clone(&store),
        Arc::new(test_clock()),
        Arc::new(notifier.clone()),
    );
    (store, commerce, notifier)
}

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
