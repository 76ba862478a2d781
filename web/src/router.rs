//! Route table and middleware stack.

use crate::error::AppError;
use crate::handlers::{
    create_item, delete_item, get_item, health_check, list_items, readiness_check, update_item,
};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Build the application router.
///
/// ```text
/// GET    /health
/// GET    /ready
/// POST   /api/items
/// GET    /api/items
/// GET    /api/items/:id
/// PATCH  /api/items/:id
/// DELETE /api/items/:id
/// ```
///
/// Anything else, including an unsupported method on a known path, is a
/// 404 `{ "message": "Route not found" }`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/items",
            get(list_items).post(create_item).fallback(route_not_found),
        )
        .route(
            "/items/:id",
            get(get_item)
                .patch(update_item)
                .delete(delete_item)
                .fallback(route_not_found),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(correlation_id_layer())
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn route_not_found() -> AppError {
    AppError::route_not_found()
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = detail, "Handler panicked");
    AppError::internal().into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use axum::{body::Body, http, http::StatusCode};
    use items_testing::InMemoryItemGateway;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[allow(clippy::unused_async)]
    async fn boom() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let request = http::Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_route_not_found() {
        let app = build_router(AppState::new(Arc::new(InMemoryItemGateway::new())));

        let request = http::Request::builder()
            .method("PUT")
            .uri("/api/items")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
