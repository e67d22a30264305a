// ABOUTME: HTTP integration tests for owner widget settings
// ABOUTME: Covers first save, updates, validation and id stability

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::uninlined_format_args)]

mod common;
mod helpers;

use helpers::axum_test::TestRequest;
use serde_json::json;
use std::sync::Arc;
use widjet_server::resources::ServerResources;
use widjet_server::server::build_router;

struct SettingsSetup {
    resources: Arc<ServerResources>,
    token: String,
}

impl SettingsSetup {
    async fn new() -> anyhow::Result<Self> {
        let resources = common::create_test_resources().await?;
        let (_, token) = common::create_owner(&resources, "owner@example.com").await?;
        Ok(Self { resources, token })
    }

    fn app(&self) -> axum::Router {
        build_router(&self.resources)
    }
}

// ============================================================================
// GET /api/widget
// ============================================================================

#[tokio::test]
async fn test_get_widget_before_first_save_is_not_found() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let response = TestRequest::get("/api/widget")
        .bearer(&setup.token)
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_get_widget_requires_auth() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let response = TestRequest::get("/api/widget").send(setup.app()).await;
    assert_eq!(response.status(), 401);
}

// ============================================================================
// PUT /api/widget
// ============================================================================

#[tokio::test]
async fn test_save_then_get_round_trips_settings() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let save = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({
            "displayName": "Acme Support",
            "widgetColor": "teal",
            "isDarkTheme": true,
            "backgroundType": "solid",
            "faqEnabled": true,
            "chatbotEnabled": true,
            "chatbotInstructions": "Be brief.",
            "language": "ES",
        }))
        .send(setup.app())
        .await;

    assert_eq!(save.status(), 200);
    let saved = save.json();
    assert_eq!(saved["displayName"], "Acme Support");
    assert_eq!(saved["widgetColor"], "teal");
    assert_eq!(saved["isDarkTheme"], true);
    assert_eq!(saved["backgroundType"], "solid");
    // Language codes are stored lowercased
    assert_eq!(saved["language"], "es");
    // Branding defaults on when the request omits it
    assert_eq!(saved["showBranding"], true);
    assert!(saved["id"].is_string());
    // Internal linkage never reaches the wire
    assert!(saved.get("ownerUserId").is_none());

    let get = TestRequest::get("/api/widget")
        .bearer(&setup.token)
        .send(setup.app())
        .await;
    assert_eq!(get.status(), 200);
    assert_eq!(get.json()["displayName"], "Acme Support");
}

#[tokio::test]
async fn test_widget_id_survives_resaves() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let first = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({ "widgetColor": "blue" }))
        .send(setup.app())
        .await
        .json();
    let first_id = first["id"].as_str().unwrap().to_owned();

    let second = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({ "widgetColor": "green" }))
        .send(setup.app())
        .await
        .json();

    // Embed snippets keep working across edits
    assert_eq!(second["id"], first_id.as_str());
    assert_eq!(second["widgetColor"], "green");
}

#[tokio::test]
async fn test_save_rejects_unknown_palette_color() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let response = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({ "widgetColor": "mauve" }))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(response.json()["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_save_rejects_unknown_background_type() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let response = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({ "backgroundType": "plaid" }))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_save_rejects_non_http_urls() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let response = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({ "avatarUrl": "javascript:alert(1)" }))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_empty_save_applies_defaults() {
    let setup = SettingsSetup::new().await.expect("Setup failed");

    let response = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({}))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 200);
    let saved = response.json();
    assert_eq!(saved["widgetColor"], "blue");
    assert_eq!(saved["backgroundType"], "gradient");
    assert_eq!(saved["language"], "en");
    assert_eq!(saved["showBranding"], true);
    assert!(saved.get("displayName").is_none());
}
