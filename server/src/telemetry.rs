//! Tracing subscriber setup.

use crate::config::Environment;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "items_server=info,items_web=info,items_postgres=info,tower_http=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Production logs use the compact
/// formatter without ANSI colours.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(environment: Environment) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match environment {
        Environment::Production => registry
            .with(fmt::layer().compact().with_ansi(false))
            .try_init()?,
        Environment::Development | Environment::Test => registry.with(fmt::layer()).try_init()?,
    }

    Ok(())
}
