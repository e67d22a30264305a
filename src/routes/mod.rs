// ABOUTME: Route module organization for the Widjet HTTP API
// ABOUTME: Public widget surface, owner dashboard endpoints and inbound webhooks

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Route modules organized by domain
//!
//! Each module contains route definitions plus thin handlers that delegate
//! to the database layer and provider clients. The public widget surface
//! (loader, config, relay) authenticates with visitor tokens; dashboard
//! endpoints require a bearer session token.

/// Email code login and session routes
pub mod auth;
/// Subscription status route
pub mod billing;
/// Branding extraction route
pub mod branding;
/// Widget content collection routes
pub mod content;
/// Owner dashboard conversation routes
pub mod conversations;
/// Health check and readiness routes
pub mod health;
/// Loader script route
pub mod loader;
/// Chat relay routes
pub mod messages;
/// Inbound webhook routes
pub mod webhooks;
/// Assembled widget config route
pub mod widget_config;
/// Owner widget settings routes
pub mod widgets;

pub use auth::AuthRoutes;
pub use billing::BillingRoutes;
pub use branding::BrandingRoutes;
pub use content::ContentRoutes;
pub use conversations::ConversationRoutes;
pub use health::HealthRoutes;
pub use loader::LoaderRoutes;
pub use messages::MessageRoutes;
pub use webhooks::WebhookRoutes;
pub use widget_config::WidgetConfigRoutes;
pub use widgets::WidgetRoutes;

use crate::auth::AuthManager;
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

/// Owner identity established from a bearer session token
#[derive(Debug, Clone)]
pub struct AuthenticatedOwner {
    /// Owner user ID
    pub user_id: Uuid,
    /// Owner email
    pub email: String,
}

/// Validate the bearer session token on a dashboard request
///
/// # Errors
///
/// Returns an unauthorized error when the header is missing, not a bearer
/// token, or fails validation
pub(crate) fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> Result<AuthenticatedOwner, AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(AppError::auth_required)?;

    let claims = resources.auth_manager.validate_token(token)?;
    let user_id = AuthManager::user_id_from_claims(&claims)?;

    Ok(AuthenticatedOwner {
        user_id,
        email: claims.email,
    })
}

/// Trim an optional string field, mapping empty to absent
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Require a non-empty trimmed text field
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    normalize_optional(value)
        .ok_or_else(|| AppError::invalid_input(format!("{field} is required")))
}

/// Require http(s) for stored URLs when the field is present
pub(crate) fn validate_optional_url(
    value: Option<String>,
    field: &str,
) -> Result<Option<String>, AppError> {
    let Some(raw) = normalize_optional(value) else {
        return Ok(None);
    };
    let parsed = url::Url::parse(&raw)
        .map_err(|_| AppError::invalid_input(format!("{field} must be a valid URL")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::invalid_input(format!(
            "{field} must use http or https"
        )));
    }
    Ok(Some(raw))
}

/// Require a present, valid http(s) URL
pub(crate) fn required_url(value: Option<String>, field: &str) -> Result<String, AppError> {
    validate_optional_url(value, field)?
        .ok_or_else(|| AppError::invalid_input(format!("{field} is required")))
}
