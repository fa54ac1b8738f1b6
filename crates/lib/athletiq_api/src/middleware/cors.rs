//! Cross-origin permission headers.
//!
//! Applied to every response, including errors and the event stream, so the
//! browser never sees a response without them. Preflight itself is answered
//! by the route's `OPTIONS` handler.

use axum::Router;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
/// Preflight cache lifetime: 24 hours.
pub const MAX_AGE_SECS: &str = "86400";

/// Wrap `router` so every response carries the permission headers.
pub fn with_cors(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(header(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN))
            .layer(header(ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS))
            .layer(header(ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS))
            .layer(header(ACCESS_CONTROL_MAX_AGE, MAX_AGE_SECS)),
    )
}

fn header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}
