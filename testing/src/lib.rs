//! # Items Testing
//!
//! Testing utilities for the items service.
//!
//! This crate provides:
//! - In-memory [`ItemGateway`](items_core::ItemGateway) implementation for fast, deterministic tests
//! - Fault-injecting gateways (failing, slow) for error mapping tests
//! - A fixed clock and payload fixtures
//!
//! ## Example
//!
//! ```
//! use items_core::{ItemGateway, NewItem};
//! use items_testing::InMemoryItemGateway;
//!
//! # tokio_test::block_on(async {
//! let gateway = InMemoryItemGateway::new();
//! let item = gateway.create(NewItem::new("Lamp", "")).await.unwrap();
//! assert_eq!(gateway.find_by_id(&item.id.to_string()).await.unwrap(), item);
//! # });
//! ```

/// Mock implementations for testing.
pub mod mocks {
    use chrono::{DateTime, Utc};
    use items_core::environment::{Clock, SystemClock};
    use items_core::{GatewayError, GatewayFuture, Item, ItemGateway, ItemId, ItemPatch, NewItem};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use items_testing::mocks::FixedClock;
    /// use items_core::environment::Clock;
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
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// In-memory item gateway.
    ///
    /// Items are kept in insertion order. Clones share the same storage, so a
    /// test can keep a handle while the router owns another.
    #[derive(Clone)]
    pub struct InMemoryItemGateway {
        items: Arc<Mutex<Vec<Item>>>,
        clock: Arc<dyn Clock>,
    }

    impl std::fmt::Debug for InMemoryItemGateway {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("InMemoryItemGateway")
                .field("items", &self.items)
                .finish_non_exhaustive()
        }
    }

    impl InMemoryItemGateway {
        /// Create an empty gateway using the system clock.
        #[must_use]
        pub fn new() -> Self {
            Self::with_clock(Arc::new(SystemClock))
        }

        /// Create an empty gateway stamping `created_at` from `clock`.
        #[must_use]
        pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
            Self {
                items: Arc::new(Mutex::new(Vec::new())),
                clock,
            }
        }

        /// Number of stored items.
        ///
        /// # Errors
        ///
        /// Returns `Database` if the storage lock is poisoned.
        pub fn len(&self) -> Result<usize, GatewayError> {
            Ok(self.lock()?.len())
        }

        /// Returns `true` if nothing is stored.
        ///
        /// # Errors
        ///
        /// Returns `Database` if the storage lock is poisoned.
        pub fn is_empty(&self) -> Result<bool, GatewayError> {
            Ok(self.lock()?.is_empty())
        }

        fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Item>>, GatewayError> {
            self.items
                .lock()
                .map_err(|_| GatewayError::Database("item storage lock poisoned".to_string()))
        }
    }

    impl Default for InMemoryItemGateway {
        fn default() -> Self {
            Self::new()
        }
    }

    // Mirrors the non-empty name constraint of the real store.
    fn check_name(name: &str) -> Result<(), GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::Rejected("Item name is required".to_string()));
        }
        Ok(())
    }

    impl ItemGateway for InMemoryItemGateway {
        fn create(&self, new_item: NewItem) -> GatewayFuture<'_, Item> {
            Box::pin(async move {
                check_name(&new_item.name)?;
                let item = Item {
                    id: ItemId::generate(),
                    name: new_item.name,
                    description: new_item.description,
                    created_at: self.clock.now(),
                };
                self.lock()?.push(item.clone());
                Ok(item)
            })
        }

        fn find_all(&self) -> GatewayFuture<'_, Vec<Item>> {
            Box::pin(async move { Ok(self.lock()?.clone()) })
        }

        fn find_by_id<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, Item> {
            Box::pin(async move {
                let id = ItemId::parse(id)?;
                self.lock()?
                    .iter()
                    .find(|item| item.id == id)
                    .cloned()
                    .ok_or_else(|| GatewayError::NotFound(id.to_string()))
            })
        }

        fn update<'a>(&'a self, id: &'a str, patch: ItemPatch) -> GatewayFuture<'a, Item> {
            Box::pin(async move {
                let id = ItemId::parse(id)?;
                if let Some(name) = &patch.name {
                    check_name(name)?;
                }
                let mut items = self.lock()?;
                let item = items
                    .iter_mut()
                    .find(|item| item.id == id)
                    .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
                item.apply(&patch);
                Ok(item.clone())
            })
        }

        fn delete<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, ()> {
            Box::pin(async move {
                let id = ItemId::parse(id)?;
                let mut items = self.lock()?;
                let position = items
                    .iter()
                    .position(|item| item.id == id)
                    .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
                items.remove(position);
                Ok(())
            })
        }

        fn ping(&self) -> GatewayFuture<'_, ()> {
            Box::pin(async move { self.lock().map(|_| ()) })
        }
    }

    /// Gateway that fails every operation with the same error.
    #[derive(Debug, Clone)]
    pub struct FailingItemGateway {
        error: GatewayError,
    }

    impl FailingItemGateway {
        /// Fail every call with `error`.
        #[must_use]
        pub const fn new(error: GatewayError) -> Self {
            Self { error }
        }

        /// Fail every call as if the database were unreachable.
        #[must_use]
        pub fn unreachable() -> Self {
            Self::new(GatewayError::Database("connection refused".to_string()))
        }

        fn fail<T>(&self) -> GatewayFuture<'_, T>
        where
            T: Send + 'static,
        {
            let error = self.error.clone();
            Box::pin(async move { Err(error) })
        }
    }

    impl ItemGateway for FailingItemGateway {
        fn create(&self, _item: NewItem) -> GatewayFuture<'_, Item> {
            self.fail()
        }

        fn find_all(&self) -> GatewayFuture<'_, Vec<Item>> {
            self.fail()
        }

        fn find_by_id<'a>(&'a self, _id: &'a str) -> GatewayFuture<'a, Item> {
            self.fail()
        }

        fn update<'a>(&'a self, _id: &'a str, _patch: ItemPatch) -> GatewayFuture<'a, Item> {
            self.fail()
        }

        fn delete<'a>(&'a self, _id: &'a str) -> GatewayFuture<'a, ()> {
            self.fail()
        }

        fn ping(&self) -> GatewayFuture<'_, ()> {
            self.fail()
        }
    }

    /// Gateway that delays every call before delegating to `inner`.
    ///
    /// Used to exercise persistence timeouts.
    #[derive(Clone)]
    pub struct SlowItemGateway<G> {
        inner: G,
        delay: Duration,
    }

    impl<G> SlowItemGateway<G> {
        /// Delay every call to `inner` by `delay`.
        #[must_use]
        pub const fn new(inner: G, delay: Duration) -> Self {
            Self { inner, delay }
        }
    }

    impl<G: ItemGateway> ItemGateway for SlowItemGateway<G> {
        fn create(&self, item: NewItem) -> GatewayFuture<'_, Item> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.inner.create(item).await
            })
        }

        fn find_all(&self) -> GatewayFuture<'_, Vec<Item>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.inner.find_all().await
            })
        }

        fn find_by_id<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, Item> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.inner.find_by_id(id).await
            })
        }

        fn update<'a>(&'a self, id: &'a str, patch: ItemPatch) -> GatewayFuture<'a, Item> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.inner.update(id, patch).await
            })
        }

        fn delete<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, ()> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.inner.delete(id).await
            })
        }

        fn ping(&self) -> GatewayFuture<'_, ()> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.inner.ping().await
            })
        }
    }
}

/// Payload fixtures and seeding helpers.
pub mod fixtures {
    use items_core::{GatewayError, Item, ItemGateway, NewItem};
    use serde_json::{Value, json};

    /// A well-formed id that no gateway ever hands out in tests.
    pub const UNUSED_ID: &str = "00000000-0000-4000-8000-000000000000";

    /// An id outside the identifier syntax.
    pub const MALFORMED_ID: &str = "invalid-id";

    /// Valid create payload.
    #[must_use]
    pub fn create_payload(name: &str, description: &str) -> Value {
        json!({ "name": name, "description": description })
    }

    /// Create payload without a name.
    #[must_use]
    pub fn missing_name_payload() -> Value {
        json!({ "description": "Missing name field." })
    }

    /// Store `items` in order and return what the gateway handed back.
    ///
    /// # Errors
    ///
    /// Propagates the first gateway error.
    pub async fn seed(
        gateway: &dyn ItemGateway,
        items: &[(&str, &str)],
    ) -> Result<Vec<Item>, GatewayError> {
        let mut stored = Vec::with_capacity(items.len());
        for (name, description) in items {
            stored.push(gateway.create(NewItem::new(*name, *description)).await?);
        }
        Ok(stored)
    }
}

/// Test helpers and utilities.
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs it.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{FailingItemGateway, FixedClock, InMemoryItemGateway, SlowItemGateway, test_clock};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use fixtures::{MALFORMED_ID, UNUSED_ID, seed};
    use items_core::environment::Clock;
    use items_core::{GatewayError, ItemGateway, ItemPatch, NewItem};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_gateways_are_shareable() {
        fn assert_shared(_: Arc<dyn ItemGateway>) {}
        assert_shared(Arc::new(InMemoryItemGateway::new()));
        assert_shared(Arc::new(FailingItemGateway::unreachable()));
    }

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_created_at() {
        let gateway = InMemoryItemGateway::with_clock(Arc::new(test_clock()));
        let a = gateway.create(NewItem::new("A", "first")).await.unwrap();
        let b = gateway.create(NewItem::new("B", "")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, test_clock().now());
        assert_eq!(a.name, "A");
        assert_eq!(a.description, "first");
    }

    #[tokio::test]
    async fn test_find_all_preserves_insertion_order() {
        let gateway = InMemoryItemGateway::new();
        assert!(gateway.find_all().await.unwrap().is_empty());

        let stored = seed(&gateway, &[("Item 1", "Description 1"), ("Item 2", "Description 2")])
            .await
            .unwrap();
        assert_eq!(gateway.find_all().await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_find_by_id_outcomes() {
        let gateway = InMemoryItemGateway::new();
        let item = gateway.create(NewItem::new("Single Item", "")).await.unwrap();

        assert_eq!(gateway.find_by_id(&item.id.to_string()).await.unwrap(), item);
        assert!(gateway.find_by_id(UNUSED_ID).await.unwrap_err().is_not_found());
        assert_eq!(
            gateway.find_by_id(MALFORMED_ID).await.unwrap_err(),
            GatewayError::MalformedId(MALFORMED_ID.to_string())
        );
    }

    #[tokio::test]
    async fn test_update_applies_only_present_fields() {
        let gateway = InMemoryItemGateway::new();
        let item = gateway.create(NewItem::new("Old Name", "Old Description")).await.unwrap();
        let id = item.id.to_string();

        let updated = gateway
            .update(&id, ItemPatch { name: Some("New Name".into()), description: None })
            .await
            .unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.description, "Old Description");
        assert_eq!(updated.created_at, item.created_at);
        assert_eq!(gateway.find_by_id(&id).await.unwrap(), updated);

        assert!(gateway.update(UNUSED_ID, ItemPatch::default()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_store_rejects_blank_name() {
        let gateway = InMemoryItemGateway::new();
        let err = gateway.create(NewItem::new("  ", "")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
        assert!(gateway.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let gateway = InMemoryItemGateway::new();
        let item = gateway.create(NewItem::new("To Be Deleted", "")).await.unwrap();
        let id = item.id.to_string();

        gateway.delete(&id).await.unwrap();
        assert!(gateway.delete(&id).await.unwrap_err().is_not_found());
        assert!(gateway.find_by_id(&id).await.unwrap_err().is_not_found());
        assert_eq!(gateway.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failing_gateway_returns_configured_error() {
        let gateway = FailingItemGateway::unreachable();
        assert!(gateway.find_all().await.unwrap_err().is_fault());
        assert!(gateway.ping().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_gateway_delays_then_delegates() {
        let gateway = SlowItemGateway::new(InMemoryItemGateway::new(), Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        gateway.create(NewItem::new("Late", "")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
