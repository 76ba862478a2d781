//! Item CRUD handlers.
//!
//! Each handler validates its input, awaits exactly one gateway call under
//! the persistence timeout and maps the outcome to a response. Failure
//! statuses differ per operation:
//!
//! | Handler  | Not found | Malformed id | Store fault |
//! |----------|-----------|--------------|-------------|
//! | create   | n/a       | n/a          | 400         |
//! | list     | n/a       | n/a          | 500         |
//! | get      | 404       | 500          | 500         |
//! | update   | 404       | 400          | 400         |
//! | delete   | 404       | 500          | 500         |

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{CorrelationId, JsonPayload};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use items_core::{
    GatewayError, Item,
    validation::{validate_create, validate_update},
};
use serde::{Deserialize, Serialize};

/// Message returned after a successful delete.
pub const ITEM_DELETED: &str = "Item deleted successfully";

/// Body of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Confirmation message
    pub message: String,
}

/// Write failures surface the store's message as a client error.
fn write_failure(correlation_id: CorrelationId, error: GatewayError) -> AppError {
    tracing::warn!(%correlation_id, %error, "Item write failed");
    AppError::bad_request(error.to_string())
}

/// Read failures are opaque server errors.
fn read_failure(correlation_id: CorrelationId, error: GatewayError) -> AppError {
    tracing::warn!(%correlation_id, %error, "Item read failed");
    AppError::internal().with_source(error.into())
}

/// Create an item.
///
/// # Endpoint
///
/// ```text
/// POST /api/items
/// { "name": "Lamp", "description": "Desk lamp" }
/// ```
///
/// # Errors
///
/// - 400 `{ "errors": [...] }` when validation fails
/// - 400 `{ "message": ... }` when the store rejects or fails the write
pub async fn create_item(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    JsonPayload(payload): JsonPayload,
) -> WebResult<(StatusCode, Json<Item>)> {
    let new_item = validate_create(&payload)?;

    let item = state
        .persist(state.gateway().create(new_item))
        .await
        .map_err(|error| write_failure(correlation_id, error))?;

    tracing::info!(%correlation_id, item_id = %item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// List every item in insertion order.
///
/// # Errors
///
/// - 500 on any store fault
pub async fn list_items(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> WebResult<Json<Vec<Item>>> {
    let items = state
        .persist(state.gateway().find_all())
        .await
        .map_err(|error| read_failure(correlation_id, error))?;

    tracing::debug!(%correlation_id, count = items.len(), "Items listed");
    Ok(Json(items))
}

/// Fetch one item.
///
/// # Errors
///
/// - 404 when no item has this id
/// - 500 for a malformed id or a store fault
pub async fn get_item(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
) -> WebResult<Json<Item>> {
    let item = state
        .persist(state.gateway().find_by_id(&id))
        .await
        .map_err(|error| match error {
            GatewayError::NotFound(_) => AppError::item_not_found(),
            other => read_failure(correlation_id, other),
        })?;

    tracing::debug!(%correlation_id, item_id = %item.id, "Item fetched");
    Ok(Json(item))
}

/// Partially update an item.
///
/// Only the fields present in the body are validated and written. An empty
/// body returns the item unchanged.
///
/// # Errors
///
/// - 400 `{ "errors": [...] }` when a provided field is invalid
/// - 404 when no item has this id
/// - 400 `{ "message": ... }` for a malformed id or a store fault
pub async fn update_item(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> WebResult<Json<Item>> {
    let patch = validate_update(&payload)?;

    let item = state
        .persist(state.gateway().update(&id, patch))
        .await
        .map_err(|error| match error {
            GatewayError::NotFound(_) => AppError::item_not_found(),
            other => write_failure(correlation_id, other),
        })?;

    tracing::info!(%correlation_id, item_id = %item.id, "Item updated");
    Ok(Json(item))
}

/// Delete an item.
///
/// # Errors
///
/// - 404 when no item has this id
/// - 500 for a malformed id or a store fault
pub async fn delete_item(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(id): Path<String>,
) -> WebResult<Json<DeleteResponse>> {
    state
        .persist(state.gateway().delete(&id))
        .await
        .map_err(|error| match error {
            GatewayError::NotFound(_) => AppError::item_not_found(),
            other => read_failure(correlation_id, other),
        })?;

    tracing::info!(%correlation_id, item_id = %id, "Item deleted");
    Ok(Json(DeleteResponse {
        message: ITEM_DELETED.to_string(),
    }))
}
