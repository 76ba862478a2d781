//! Shared service context for handlers.

use items_core::{GatewayError, ItemGateway};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a single persistence call unless configured otherwise.
pub const DEFAULT_PERSISTENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared by every handler.
///
/// Cloned per request; clones share the gateway.
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(Arc::new(gateway))
///     .with_persistence_timeout(Duration::from_millis(500));
/// let app = build_router(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<dyn ItemGateway>,
    persistence_timeout: Duration,
}

impl AppState {
    /// Create state over `gateway` with the default persistence timeout.
    #[must_use]
    pub fn new(gateway: Arc<dyn ItemGateway>) -> Self {
        Self {
            gateway,
            persistence_timeout: DEFAULT_PERSISTENCE_TIMEOUT,
        }
    }

    /// Replace the persistence timeout.
    #[must_use]
    pub const fn with_persistence_timeout(mut self, timeout: Duration) -> Self {
        self.persistence_timeout = timeout;
        self
    }

    /// The item gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn ItemGateway {
        self.gateway.as_ref()
    }

    /// The configured persistence timeout.
    #[must_use]
    pub const fn persistence_timeout(&self) -> Duration {
        self.persistence_timeout
    }

    /// Await a gateway call, giving up after the persistence timeout.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or [`GatewayError::Timeout`] if it did
    /// not finish in time.
    pub async fn persist<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        tokio::time::timeout(self.persistence_timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.persistence_timeout)))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("persistence_timeout", &self.persistence_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use items_core::NewItem;
    use items_testing::{InMemoryItemGateway, SlowItemGateway};

    #[tokio::test]
    async fn test_persist_passes_result_through() {
        let state = AppState::new(Arc::new(InMemoryItemGateway::new()));

        let item = state
            .persist(state.gateway().create(NewItem::new("Lamp", "")))
            .await
            .unwrap();
        assert_eq!(item.name, "Lamp");

        let missing = state.persist(state.gateway().find_by_id("invalid-id")).await;
        assert!(matches!(missing, Err(GatewayError::MalformedId(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persist_times_out() {
        let slow = SlowItemGateway::new(InMemoryItemGateway::new(), Duration::from_secs(60));
        let state = AppState::new(Arc::new(slow)).with_persistence_timeout(Duration::from_secs(1));

        let result = state.persist(state.gateway().find_all()).await;
        assert_eq!(result, Err(GatewayError::Timeout(Duration::from_secs(1))));
    }
}
