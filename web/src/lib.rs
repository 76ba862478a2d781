//! Axum HTTP surface for the items service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP shell (Axum)               │  ← routing, JSON, CORS
//! │  - Body parsing and validation          │  ← correlation IDs, tracing
//! │  - Status/body mapping                  │
//! ├─────────────────────────────────────────┤
//! │         Item gateway (items-core)       │
//! │  - One awaited call per request         │  ← persistence timeout
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Parse** the body as untyped JSON ([`extractors::JsonPayload`])
//! 2. **Validate** it with `items_core::validation`, short-circuiting on failure
//! 3. **Persist** through the gateway under the timeout ([`AppState::persist`])
//! 4. **Map** the outcome to a status and JSON body ([`AppError`])
//!
//! # Example
//!
//! ```ignore
//! use items_web::{AppState, build_router};
//!
//! let state = AppState::new(Arc::new(gateway));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, build_router(state)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CorrelationId, JsonPayload};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
