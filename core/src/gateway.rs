//! Persistence gateway contract for the item collection.
//!
//! The gateway is the only component that touches storage. Request handlers
//! receive an `Arc<dyn ItemGateway>` through the service context and await
//! exactly one gateway call per request.
//!
//! # Implementations
//!
//! - `PostgresItemGateway` (in `items-postgres`): JSONB document collection
//! - `InMemoryItemGateway` (in `items-testing`): fast, deterministic tests
//!
//! # Identifiers
//!
//! Operations addressing a single item take the identifier as raw text, the
//! way it arrives in a request path. Text outside the identifier syntax is
//! reported as [`GatewayError::MalformedId`] before any storage access, while
//! a well-formed identifier with no record is [`GatewayError::NotFound`].
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! trait can be used as `Arc<dyn ItemGateway>`.

use crate::item::{Item, ItemPatch, NewItem};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Boxed future returned by gateway operations.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Errors that can occur during gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No record exists for the identifier.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// The identifier is not in the store's identifier syntax.
    #[error("Malformed item id: {0}")]
    MalformedId(String),

    /// The store refused the write (schema or constraint violation).
    #[error("{0}")]
    Rejected(String),

    /// The store is unreachable or failed while executing the operation.
    #[error("Database error: {0}")]
    Database(String),

    /// The operation did not complete within the allotted time.
    #[error("Persistence call timed out after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    /// Returns `true` for [`GatewayError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` for store faults (anything other than a missing record
    /// or a malformed identifier).
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Database(_) | Self::Timeout(_))
    }
}

/// Gateway over the item collection.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single instance serves every
/// request concurrently. Connection handling (pooling) is the
/// implementation's concern.
pub trait ItemGateway: Send + Sync {
    /// Store a new item, assigning its `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// - `Rejected`: the store refused the document
    /// - `Database`: the store is unreachable
    fn create(&self, item: NewItem) -> GatewayFuture<'_, Item>;

    /// All items in insertion order (empty if there are none).
    ///
    /// # Errors
    ///
    /// - `Database`: the store is unreachable
    fn find_all(&self) -> GatewayFuture<'_, Vec<Item>>;

    /// Look up one item.
    ///
    /// # Errors
    ///
    /// - `MalformedId`: `id` is not in the identifier syntax
    /// - `NotFound`: no item has this id
    /// - `Database`: the store is unreachable
    fn find_by_id<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, Item>;

    /// Apply the fields present in `patch` and return the full updated item.
    ///
    /// # Errors
    ///
    /// - `MalformedId`: `id` is not in the identifier syntax
    /// - `NotFound`: no item has this id
    /// - `Rejected`: the store refused the change
    /// - `Database`: the store is unreachable
    fn update<'a>(&'a self, id: &'a str, patch: ItemPatch) -> GatewayFuture<'a, Item>;

    /// Remove one item.
    ///
    /// # Errors
    ///
    /// - `MalformedId`: `id` is not in the identifier syntax
    /// - `NotFound`: no item has this id (including one deleted earlier)
    /// - `Database`: the store is unreachable
    fn delete<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, ()>;

    /// Cheap connectivity probe used by readiness checks.
    ///
    /// # Errors
    ///
    /// - `Database`: the store is unreachable
    fn ping(&self) -> GatewayFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(GatewayError::NotFound("x".into()).is_not_found());
        assert!(!GatewayError::NotFound("x".into()).is_fault());
        assert!(!GatewayError::MalformedId("x".into()).is_fault());
        assert!(GatewayError::Rejected("x".into()).is_fault());
        assert!(GatewayError::Database("x".into()).is_fault());
        assert!(GatewayError::Timeout(Duration::from_millis(5)).is_fault());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            GatewayError::Database("connection refused".into()).to_string(),
            "Database error: connection refused"
        );
        assert_eq!(
            GatewayError::Timeout(Duration::from_millis(250)).to_string(),
            "Persistence call timed out after 250ms"
        );
    }

    #[test]
    fn test_gateway_is_dyn_compatible() {
        fn assert_dyn(_: Option<&dyn ItemGateway>) {}
        assert_dyn(None);
    }
}
