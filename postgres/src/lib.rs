//! `PostgreSQL` item gateway for the items service.
//!
//! This crate provides a PostgreSQL-backed implementation of the
//! [`ItemGateway`] trait from `items-core`. Items are stored as JSONB
//! documents, one row per item:
//!
//! ```text
//! items
//! ├── id          UUID PRIMARY KEY       store-assigned identifier
//! ├── seq         BIGSERIAL              insertion order for listing
//! ├── document    JSONB                  { "name": ..., "description": ... }
//! └── created_at  TIMESTAMPTZ            set once on insert
//! ```
//!
//! The table carries a CHECK constraint requiring a non-blank string `name`,
//! so the store rejects documents that slipped past request validation.
//! Partial updates merge the patch into the document (`document || $patch`),
//! leaving absent fields untouched.
//!
//! # Example
//!
//! ```no_run
//! use items_postgres::{PostgresConfig, PostgresItemGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PostgresConfig::new("postgres://localhost/items");
//! let gateway = PostgresItemGateway::connect(&config).await?;
//! gateway.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use items_core::environment::{Clock, SystemClock};
use items_core::{GatewayError, GatewayFuture, Item, ItemGateway, ItemId, ItemPatch, NewItem};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Name of the CHECK constraint guarding the item name.
const NAME_CONSTRAINT: &str = "items_name_not_blank";

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// `PostgreSQL` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Timeout for acquiring a connection, in seconds
    pub connect_timeout: u64,
}

impl PostgresConfig {
    /// Settings for `url` with default pool sizing.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 5,
        }
    }

    /// Parse the connection URL without connecting.
    ///
    /// # Errors
    ///
    /// Returns the parser's message if the URL is not a valid `PostgreSQL`
    /// connection string.
    pub fn connect_options(&self) -> Result<PgConnectOptions, String> {
        PgConnectOptions::from_str(&self.url).map_err(|e| e.to_string())
    }
}

/// Stored JSONB document body.
#[derive(Debug, Serialize, Deserialize)]
struct ItemDocument {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    document: Json<ItemDocument>,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        let ItemDocument { name, description } = row.document.0;
        Self {
            id: ItemId::from_uuid(row.id),
            name,
            description,
            created_at: row.created_at,
        }
    }
}

/// Map a driver error to the gateway taxonomy.
fn map_error(operation: &str, err: sqlx::Error) -> GatewayError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(NAME_CONSTRAINT) {
            return GatewayError::Rejected(
                "Item validation failed: name: Item name is required".to_string(),
            );
        }
        if matches!(
            db_err.kind(),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation | ErrorKind::UniqueViolation
        ) {
            return GatewayError::Rejected(db_err.message().to_string());
        }
    }
    tracing::error!(operation, error = %err, "Item store operation failed");
    GatewayError::Database(format!("Failed to {operation}: {err}"))
}

/// `PostgreSQL` item gateway.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct PostgresItemGateway {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresItemGateway {
    /// Create a gateway over an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp `created_at`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Connect a new pool using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] if the URL is invalid or the
    /// database cannot be reached within the connect timeout.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, GatewayError> {
        let options = config
            .connect_options()
            .map_err(|e| GatewayError::Database(format!("Invalid database URL: {e}")))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect_with(options)
            .await
            .map_err(|e| GatewayError::Database(format!("Failed to connect: {e}")))?;

        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connected to item store"
        );

        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] if migrations fail.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ItemGateway for PostgresItemGateway {
    fn create(&self, item: NewItem) -> GatewayFuture<'_, Item> {
        Box::pin(async move {
            let id = ItemId::generate();
            let document = ItemDocument {
                name: item.name,
                description: item.description,
            };

            let row: ItemRow = sqlx::query_as(
                r"
                INSERT INTO items (id, document, created_at)
                VALUES ($1, $2, $3)
                RETURNING id, document, created_at
                ",
            )
            .bind(id.as_uuid())
            .bind(Json(&document))
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_error("create item", e))?;

            tracing::debug!(item_id = %id, "Item created");
            Ok(row.into())
        })
    }

    fn find_all(&self) -> GatewayFuture<'_, Vec<Item>> {
        Box::pin(async move {
            let rows: Vec<ItemRow> = sqlx::query_as(
                r"
                SELECT id, document, created_at
                FROM items
                ORDER BY seq ASC
                ",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_error("list items", e))?;

            Ok(rows.into_iter().map(Item::from).collect())
        })
    }

    fn find_by_id<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, Item> {
        Box::pin(async move {
            let id = ItemId::parse(id)?;

            let row: Option<ItemRow> = sqlx::query_as(
                r"
                SELECT id, document, created_at
                FROM items
                WHERE id = $1
                ",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_error("get item", e))?;

            row.map(Item::from)
                .ok_or_else(|| GatewayError::NotFound(id.to_string()))
        })
    }

    fn update<'a>(&'a self, id: &'a str, patch: ItemPatch) -> GatewayFuture<'a, Item> {
        Box::pin(async move {
            let id = ItemId::parse(id)?;

            // Absent patch fields are skipped during serialization, so the
            // merge only overwrites what the caller sent.
            let row: Option<ItemRow> = sqlx::query_as(
                r"
                UPDATE items
                SET document = document || $2
                WHERE id = $1
                RETURNING id, document, created_at
                ",
            )
            .bind(id.as_uuid())
            .bind(Json(&patch))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_error("update item", e))?;

            let item = row
                .map(Item::from)
                .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
            tracing::debug!(item_id = %id, "Item updated");
            Ok(item)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let id = ItemId::parse(id)?;

            let result = sqlx::query("DELETE FROM items WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| map_error("delete item", e))?;

            if result.rows_affected() == 0 {
                return Err(GatewayError::NotFound(id.to_string()));
            }

            tracing::debug!(item_id = %id, "Item deleted");
            Ok(())
        })
    }

    fn ping(&self) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| map_error("ping item store", e))?;
            Ok(())
        })
    }
}
