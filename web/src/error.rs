//! Error types for web handlers.
//!
//! This module bridges domain errors (validation and gateway failures) and
//! HTTP responses. [`AppError`] implements Axum's `IntoResponse`, rendering
//! one of two JSON bodies:
//!
//! ```json
//! { "message": "Item not found" }
//! { "errors": [ { "path": "name", "msg": "Name is required" } ] }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use items_core::{FieldError, ValidationErrors};
use serde::Serialize;
use std::fmt;

/// Message for a missing item.
pub const ITEM_NOT_FOUND: &str = "Item not found";
/// Message for an unmatched route.
pub const ROUTE_NOT_FOUND: &str = "Route not found";
/// Message for every unexpected server-side failure.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// JSON body of an error response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{ "message": ... }`
    Message { message: String },
    /// `{ "errors": [...] }`
    Errors { errors: Vec<FieldError> },
}

/// Application error type for web handlers.
///
/// Carries the status, the client-facing body and, optionally, the internal
/// error that caused it. The source is logged for server errors and never
/// sent to the client.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Item>, AppError> {
///     let item = gateway.find_by_id(&id).await
///         .map_err(|e| AppError::internal().with_source(e.into()))?;
///     Ok(Json(item))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Response body (user-facing)
    body: ErrorBody,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error with a `{ "message": ... }` body.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::Message {
                message: message.into(),
            },
            source: None,
        }
    }

    /// Attach the internal error that caused this response.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 400 Bad Request carrying structured field errors.
    #[must_use]
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::Errors {
                errors: errors.into_inner(),
            },
            source: None,
        }
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 404 for an id with no item behind it.
    #[must_use]
    pub fn item_not_found() -> Self {
        Self::not_found(ITEM_NOT_FOUND)
    }

    /// 404 for a path no route matches.
    #[must_use]
    pub fn route_not_found() -> Self {
        Self::not_found(ROUTE_NOT_FOUND)
    }

    /// Create a 500 Internal Server Error with the generic message.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
    }

    /// The HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The `message` field, if this is a message body.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            ErrorBody::Message { message } => Some(message),
            ErrorBody::Errors { .. } => None,
        }
    }

    /// The field errors, if this is a validation body.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match &self.body {
            ErrorBody::Errors { errors } => errors.as_slice(),
            ErrorBody::Message { .. } => &[],
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            ErrorBody::Message { message } => write!(f, "[{}] {message}", self.status.as_u16()),
            ErrorBody::Errors { errors } => {
                let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "[{}] {}", self.status.as_u16(), errors.join("; "))
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(status = %self.status, "Internal server error");
            }
        } else {
            tracing::debug!(status = %self.status, error = %self, "Request rejected");
        }

        (self.status, Json(self.body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal().with_source(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use items_core::validation::validate_create;
    use serde_json::{Value, json};

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[400] Invalid input");
    }

    #[test]
    fn test_item_not_found() {
        let err = AppError::item_not_found();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), Some(ITEM_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_message_body_shape() {
        let (status, body) = body_json(AppError::route_not_found()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Route not found" }));
    }

    #[tokio::test]
    async fn test_validation_body_shape() {
        let errors = validate_create(&json!({})).unwrap_err();
        let err = AppError::from(errors);
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.message(), None);

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "errors": [ { "path": "name", "msg": "Name is required" } ] }));
    }

    #[tokio::test]
    async fn test_internal_error_hides_source() {
        let err = AppError::from(anyhow::anyhow!("connection refused"));
        assert!(std::error::Error::source(&err).is_some());

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Internal Server Error" }));
    }
}
