//! CORS layer

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Echoes any origin with credentials allowed; used when no origins are configured
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Restricts browsers to `origins`; the dashboard sends the refresh cookie, so credentials are allowed
pub fn cors_with_origins(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Layer for the configured origin list
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        permissive_cors()
    } else {
        cors_with_origins(origins)
    }
}
