//! Allow-list CORS.
//!
//! Origins on the allow-list get the three CORS headers on every response.
//! Any other origin gets none, so the browser blocks the call.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

use crate::ProxyState;

pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Middleware echoing CORS headers for allow-listed origins.
pub async fn cors_middleware(
    State(state): State<Arc<ProxyState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .filter(|value| {
            value
                .to_str()
                .map(|origin| state.config.allows_origin(origin))
                .unwrap_or(false)
        })
        .cloned();

    let mut response = next.run(request).await;

    match origin {
        Some(origin) => {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            );
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
        None => {
            tracing::trace!("No CORS headers for request origin");
        }
    }

    response
}
