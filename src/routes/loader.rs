// ABOUTME: Serves the embeddable widget loader script
// ABOUTME: Bakes the deployment base URL into a compile-time embedded JS template

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Loader script template embedded at compile-time
/// Loaded with `include_str`!() to avoid blocking filesystem IO at runtime
const LOADER_TEMPLATE: &str = include_str!("../../templates/widget-loader.js");

/// Loader script routes implementation
pub struct LoaderRoutes;

impl LoaderRoutes {
    /// Create the loader script route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/widget-loader.js", get(Self::serve_loader))
            .with_state(resources)
    }

    /// Serve the loader script with the public base URL baked in
    ///
    /// The script fetches the assembled widget config at runtime, so it stays
    /// cacheable for a short window without delaying configuration changes.
    async fn serve_loader(State(resources): State<Arc<ServerResources>>) -> impl IntoResponse {
        let body = render_loader(&resources.config.base_url);
        (
            [
                (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
                (header::CACHE_CONTROL, "public, max-age=300"),
            ],
            body,
        )
    }
}

/// Substitute deployment parameters into the embedded template
fn render_loader(base_url: &str) -> String {
    LOADER_TEMPLATE.replace("{{BASE_URL}}", base_url.trim_end_matches('/'))
}
