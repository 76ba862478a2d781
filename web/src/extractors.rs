//! Custom Axum extractors.
//!
//! - [`JsonPayload`]: request body as untyped JSON, with body-parser errors
//!   rendered as `400 { "message": ... }`
//! - [`CorrelationId`]: the request's correlation ID

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, header::CONTENT_TYPE, request::Parts},
};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Request body parsed as an untyped JSON value.
///
/// Validation runs on the raw value so that type mismatches (a numeric
/// `name`, say) surface as field errors instead of body rejections.
///
/// - An empty body is treated as `{}`.
/// - A non-empty body must declare a JSON content type.
/// - Unparseable JSON is a 400 with the parser's message.
///
/// # Example
///
/// ```ignore
/// async fn create(JsonPayload(payload): JsonPayload) -> Result<..., AppError> {
///     let item = validate_create(&payload)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPayload(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Object(Map::new())));
        }

        if !is_json {
            return Err(AppError::bad_request(
                "Expected request with `Content-Type: application/json`",
            ));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))
    }
}

/// `application/json`, or any `+json` suffix type, parameters ignored.
fn is_json_content_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence
            .rsplit_once('+')
            .is_some_and(|(_, suffix)| suffix.eq_ignore_ascii_case("json"))
}

/// Correlation ID for request tracing.
///
/// Read from the request extensions when the correlation-id middleware is
/// installed; otherwise taken from the `X-Correlation-ID` header, or newly
/// generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// The id carried by the `X-Correlation-ID` header, or a new one when the
    /// header is absent or not a UUID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Self(id)
    }

    /// The id as an `X-Correlation-ID` header value.
    #[must_use]
    pub fn to_header_value(self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0.to_string()).ok()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .copied()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use serde_json::json;

    async fn extract(content_type: Option<&str>, body: &str) -> Result<JsonPayload, AppError> {
        let mut builder = http::Request::builder().method("POST").uri("/api/items");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        JsonPayload::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_parses_json_object() {
        let JsonPayload(value) = extract(Some("application/json"), r#"{"name":"Lamp"}"#)
            .await
            .unwrap();
        assert_eq!(value, json!({ "name": "Lamp" }));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_object() {
        let JsonPayload(value) = extract(None, "").await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = extract(Some("application/json"), r#"{"name":"#).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_rejected() {
        let err = extract(Some("text/plain"), r#"{"name":"Lamp"}"#).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().unwrap().contains("application/json"));
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/merge-patch+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let id = Uuid::new_v4();
        let req = http::Request::builder()
            .header(CORRELATION_ID_HEADER, id.to_string())
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();

        let extracted = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, CorrelationId(id));
    }

    #[test]
    fn test_correlation_id_from_headers() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(CorrelationId::from_headers(&headers), CorrelationId(id));

        headers.insert(CORRELATION_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_ne!(CorrelationId::from_headers(&headers), CorrelationId(id));
        assert_ne!(CorrelationId::from_headers(&HeaderMap::new()).0, Uuid::nil());
    }

    #[test]
    fn test_correlation_id_header_value() {
        let id = CorrelationId(Uuid::new_v4());
        let value = id.to_header_value().unwrap();
        assert_eq!(value.to_str().unwrap(), id.to_string());
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let id = Uuid::new_v4();
        let req = http::Request::builder()
            .header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string())
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();
        parts.extensions.insert(CorrelationId(id));

        let extracted = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.0, id);
    }
}
