// ABOUTME: Inbound webhook route for the site-builder integration
// ABOUTME: HMAC-SHA256 signature verification over the raw request body

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded body MAC
const SIGNATURE_HEADER: &str = "x-widjet-signature";

/// Install/uninstall callback payload from the site-builder
///
/// Unknown fields are ignored so integration-side payload additions do not
/// break the endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBuilderEvent {
    /// Event name, `install` or `uninstall`
    pub event: String,
    /// Site identifier on the builder's side
    #[serde(default)]
    pub site_id: Option<String>,
}

/// Webhook routes implementation
pub struct WebhookRoutes;

impl WebhookRoutes {
    /// Create the inbound webhook routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/webhooks/site-builder", post(Self::site_builder))
            .with_state(resources)
    }

    /// Handle install/uninstall callbacks from the site-builder
    ///
    /// The signature covers the raw body bytes, so this handler consumes
    /// `Bytes` and parses JSON only after verification passes. With no
    /// shared secret configured the endpoint reads as absent.
    async fn site_builder(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let Some(secret) = resources.config.webhook.site_builder_secret.as_deref() else {
            return Err(AppError::not_found("Webhook"));
        };

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::auth_invalid("Missing webhook signature"))?;
        verify_signature(secret, &body, signature)?;

        let event: SiteBuilderEvent = serde_json::from_slice(&body)
            .map_err(|_| AppError::invalid_input("Malformed webhook payload"))?;

        let site_id = event.site_id.as_deref().unwrap_or("unknown");
        match event.event.as_str() {
            "install" => info!(site_id, "Site-builder reported widget install"),
            "uninstall" => info!(site_id, "Site-builder reported widget uninstall"),
            other => debug!(event = other, "Ignoring unhandled site-builder event"),
        }

        Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response())
    }
}

/// Compare the supplied hex signature against the body MAC in constant time
fn verify_signature(secret: &str, body: &[u8], supplied_hex: &str) -> Result<(), AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::internal("Webhook secret unusable as HMAC key"))?;
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    let supplied = hex::decode(supplied_hex.trim())
        .map_err(|_| AppError::auth_invalid("Invalid webhook signature"))?;

    if bool::from(supplied.ct_eq(expected.as_slice())) {
        Ok(())
    } else {
        Err(AppError::auth_invalid("Invalid webhook signature"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"event":"install","siteId":"s1"}"#;
        let signature = sign("shared-secret", body);

        assert!(verify_signature("shared-secret", body, &signature).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = sign("shared-secret", br#"{"event":"install"}"#);

        let result = verify_signature("shared-secret", br#"{"event":"uninstall"}"#, &signature);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = br#"{"event":"install"}"#;
        let signature = sign("other-secret", body);

        assert!(verify_signature("shared-secret", body, &signature).is_err());
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        let body = br#"{"event":"install"}"#;

        assert!(verify_signature("shared-secret", body, "not hex!").is_err());
        assert!(verify_signature("shared-secret", body, "abcd").is_err());
        assert!(verify_signature("shared-secret", body, "").is_err());
    }
}
