//! Items service application shell.
//!
//! Wires configuration, telemetry, the `PostgreSQL` item gateway and the
//! HTTP router together:
//!
//! ```text
//! Config::from_env ─▶ telemetry::init ─▶ build_state ─▶ build_router ─▶ serve
//!                                        (connect + migrate)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod telemetry;

pub use bootstrap::{build_state, run, serve};
pub use config::{Config, ConfigError, Environment};
