//! Application state for Axum handlers.

use growhub_core::Commerce;
use std::sync::Arc;

/// State shared across all HTTP handlers: the commerce services over one store.
pub struct AppState<S> {
    /// Every coordinator and service
    pub commerce: Arc<Commerce<S>>,
}

impl<S> AppState<S> {
    /// Wrap a [`Commerce`] facade.
    #[must_use]
    pub fn new(commerce: Commerce<S>) -> Self {
        Self {
            commerce: Arc::new(commerce),
        }
    }
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            commerce: Arc::clone(&self.commerce),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growhub_testing::InMemoryLedgerStore;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState<InMemoryLedgerStore>>();
    }
}
