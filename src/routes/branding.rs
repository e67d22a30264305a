// ABOUTME: Branding extraction route for onboarding
// ABOUTME: Validates the submitted URL against forgery targets, then delegates to the scraper

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use crate::external::validate_extraction_url;
use crate::models::BrandingExtraction;
use crate::resources::ServerResources;
use crate::routes::authenticate;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to extract branding from a site
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Site URL, http or https
    pub url: String,
}

/// Link discovered on the scraped site
#[derive(Debug, Serialize)]
pub struct DiscoveredLinkView {
    /// Link text
    pub label: String,
    /// Link target
    pub url: String,
}

/// Extraction result in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    /// URL the extraction ran against, normalized
    pub source_url: String,
    /// Site name, when discoverable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Discovered logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Nearest palette token to the site's accent color
    pub widget_color: String,
    /// Dark theme guess from background luminance
    pub is_dark_theme: bool,
    /// Navigation links worth importing as custom links
    pub links: Vec<DiscoveredLinkView>,
    /// True when the provider was unreachable and this is a placeholder
    pub degraded: bool,
}

impl From<BrandingExtraction> for ExtractResponse {
    fn from(extraction: BrandingExtraction) -> Self {
        Self {
            source_url: extraction.source_url,
            site_name: extraction.site_name,
            logo_url: extraction.logo_url,
            widget_color: extraction.widget_color,
            is_dark_theme: extraction.is_dark_theme,
            links: extraction
                .links
                .into_iter()
                .map(|link| DiscoveredLinkView {
                    label: link.label,
                    url: link.url,
                })
                .collect(),
            degraded: extraction.degraded,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Branding extraction routes implementation
pub struct BrandingRoutes;

impl BrandingRoutes {
    /// Create the branding extraction route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/branding/extract", post(Self::extract))
            .with_state(resources)
    }

    /// Scrape a site for branding signals the builder can prefill
    ///
    /// The URL guard runs before any outbound traffic; provider outages
    /// come back as a degraded placeholder rather than an error.
    async fn extract(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ExtractRequest>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;

        let target = validate_extraction_url(&request.url).await?;
        let extraction = resources.scraper.extract_branding(&target).await?;

        info!(
            user_id = %owner.user_id,
            host = target.host_str().unwrap_or_default(),
            degraded = extraction.degraded,
            "Branding extraction completed"
        );

        Ok((StatusCode::OK, Json(ExtractResponse::from(extraction))).into_response())
    }
}
