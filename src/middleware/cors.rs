// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Widget routes accept any origin; dashboard routes honor the configured list

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS for the public widget surface
///
/// The loader script and relay endpoints are called from arbitrary customer
/// sites, so these routes always allow any origin regardless of the
/// configured dashboard origin list.
#[must_use]
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_headers(allowed_headers())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// CORS for owner dashboard endpoints
///
/// Honors `CORS_ALLOWED_ORIGINS`: wildcard or empty allows any origin,
/// otherwise the comma-separated list is parsed into explicit origins.
#[must_use]
pub fn setup_cors(config: &crate::config::environment::ServerConfig) -> CorsLayer {
    let allow_origin =
        if config.cors.allowed_origins.is_empty() || config.cors.allowed_origins == "*" {
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = config
                .cors
                .allowed_origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect();

            if origins.is_empty() {
                // Fallback to any if parsing failed
                AllowOrigin::any()
            } else {
                AllowOrigin::list(origins)
            }
        };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers(allowed_headers())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

fn allowed_headers() -> [HeaderName; 8] {
    [
        HeaderName::from_static("content-type"),
        HeaderName::from_static("authorization"),
        HeaderName::from_static("x-requested-with"),
        HeaderName::from_static("accept"),
        HeaderName::from_static("origin"),
        HeaderName::from_static("access-control-request-method"),
        HeaderName::from_static("access-control-request-headers"),
        HeaderName::from_static("x-widjet-signature"),
    ]
}
