//! Response header and CORS layers for the JSON API.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Middleware that stamps every response with API hardening headers.
///
/// - **Cache-Control: no-store**: feed contents are per-neighborhood and must
///   not land in shared caches.
/// - **X-Content-Type-Options: nosniff**
/// - **Referrer-Policy: no-referrer**
/// - **X-Frame-Options: DENY**
///
/// # Usage
///
/// ```rust,no_run
/// use axum::Router;
/// use axum::middleware;
/// use grid_gate::middleware::api_headers;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(api_headers));
/// ```
pub async fn api_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    response
}

/// Build the CORS layer from the configured origin allow-list.
///
/// An empty list yields `CorsLayer::new()`, which denies all cross-origin
/// requests.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, String> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::new());
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
