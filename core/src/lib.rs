//! # Items Core
//!
//! Domain types and contracts for the items service.
//!
//! This crate has no I/O of its own. It provides:
//!
//! - **Item Entity** ([`item`]): `Item`, its opaque `ItemId`, and the
//!   normalized write payloads `NewItem` / `ItemPatch`
//! - **Validation Layer** ([`validation`]): pure payload checks producing
//!   normalized fields or structured field errors
//! - **Persistence Gateway** ([`gateway`]): the `ItemGateway` trait and the
//!   `GatewayError` taxonomy
//! - **Environment** ([`environment`]): injected dependencies such as the clock
//!
//! ## Request pipeline
//!
//! ```text
//! raw JSON ──► validation ──► NewItem / ItemPatch ──► ItemGateway ──► Item
//!                 │                                        │
//!                 └─► ValidationErrors                     └─► GatewayError
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use items_core::{validation, ItemGateway};
//!
//! async fn create(gateway: &dyn ItemGateway, payload: serde_json::Value) {
//!     match validation::validate_create(&payload) {
//!         Ok(new_item) => {
//!             let item = gateway.create(new_item).await;
//!         }
//!         Err(errors) => { /* 400 with errors */ }
//!     }
//! }
//! ```

pub mod gateway;
pub mod item;
pub mod validation;

pub use gateway::{GatewayError, GatewayFuture, ItemGateway};
pub use item::{Item, ItemId, ItemPatch, NewItem};
pub use validation::{FieldError, Mode, Normalized, ValidationErrors};

/// Environment traits for dependency injection.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use items_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let created_at = clock.now();
    /// assert!(created_at <= clock.now());
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
