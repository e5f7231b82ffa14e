//! API route handlers.

pub mod auth;
pub mod feed;
pub mod location;

use crate::auth::middleware::AppState;
use axum::{routing::get, routing::post, Json, Router};
use serde_json::{json, Value};

/// GET /health: Liveness check
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Auth endpoints
        .route("/auth/verify-signature", post(auth::verify_signature))
        // Location endpoints (authenticated, not gated)
        .route("/location/verify", post(location::verify_location))
        // Feed endpoints (authenticated + gated)
        .route("/feed", post(feed::create_post).get(feed::list_posts))
}
