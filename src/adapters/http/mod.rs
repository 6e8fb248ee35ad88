//! HTTP adapters - REST API implementations.

pub mod webhooks;

use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use webhooks::{webhook_routes, WebhookAppState, SIGNATURE_HEADER};

/// Build the complete application router.
///
/// # Routes
/// - `GET /health` - Liveness check
/// - `POST /api/webhooks/payment` - Payment gateway webhook
pub fn app_router(state: WebhookAppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhook_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
