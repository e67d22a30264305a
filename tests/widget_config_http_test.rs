// ABOUTME: HTTP integration tests for the public widget config endpoint
// ABOUTME: Payload assembly, cache invalidation, and leak checks on the public surface

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

struct ConfigSetup {
    resources: Arc<ServerResources>,
    token: String,
    widget_id: String,
}

impl ConfigSetup {
    async fn new() -> anyhow::Result<Self> {
        let resources = common::create_test_resources().await?;
        let (user, token) = common::create_owner(&resources, "owner@example.com").await?;
        let widget = common::create_widget(&resources, user.id).await?;
        Ok(Self {
            resources,
            token,
            widget_id: widget.id.to_string(),
        })
    }

    fn app(&self) -> axum::Router {
        build_router(&self.resources)
    }

    async fn fetch_config(&self) -> serde_json::Value {
        let response = TestRequest::get(&format!("/api/widget-config?id={}", self.widget_id))
            .send(self.app())
            .await;
        assert_eq!(response.status(), 200);
        response.json()
    }
}

// ============================================================================
// GET /api/widget-config
// ============================================================================

#[tokio::test]
async fn test_config_carries_settings_and_poll_interval() {
    let setup = ConfigSetup::new().await.expect("Setup failed");

    let config = setup.fetch_config().await;

    assert_eq!(config["widget_id"], setup.widget_id);
    assert_eq!(config["display_name"], "Acme Support");
    assert_eq!(config["widget_color"], "blue");
    assert_eq!(config["background_type"], "gradient");
    assert_eq!(config["language"], "en");
    assert_eq!(config["faq_enabled"], true);
    assert_eq!(config["whatsapp_enabled"], false);
    assert_eq!(config["show_branding"], true);
    assert_eq!(config["poll_interval_ms"], 5000);
    assert!(config["faq_items"].as_array().unwrap().is_empty());
    assert!(config["product_cards"].as_array().unwrap().is_empty());
    assert!(config["instagram_posts"].as_array().unwrap().is_empty());
    assert!(config["custom_links"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_widget_is_not_found() {
    let setup = ConfigSetup::new().await.expect("Setup failed");

    for id in [uuid::Uuid::new_v4().to_string(), "does-not-exist".into()] {
        let response = TestRequest::get(&format!("/api/widget-config?id={id}"))
            .send(setup.app())
            .await;
        assert_eq!(response.status(), 404, "widget id {id}");
        assert_eq!(response.json()["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_config_includes_content_in_display_order() {
    let setup = ConfigSetup::new().await.expect("Setup failed");

    for question in ["First?", "Second?"] {
        let response = TestRequest::post("/api/content/faq")
            .bearer(&setup.token)
            .json(&json!({ "question": question, "answer": "Yes." }))
            .send(setup.app())
            .await;
        assert_eq!(response.status(), 200);
    }
    let response = TestRequest::post("/api/content/links")
        .bearer(&setup.token)
        .json(&json!({ "label": "Menu", "url": "https://example.com/menu" }))
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 200);

    let config = setup.fetch_config().await;

    let faq = config["faq_items"].as_array().unwrap();
    assert_eq!(faq.len(), 2);
    assert_eq!(faq[0]["question"], "First?");
    assert_eq!(faq[1]["question"], "Second?");
    assert!(faq[0]["sort_index"].as_i64().unwrap() < faq[1]["sort_index"].as_i64().unwrap());

    let links = config["custom_links"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["label"], "Menu");
}

#[tokio::test]
async fn test_public_payload_hides_internal_fields() {
    let setup = ConfigSetup::new().await.expect("Setup failed");

    let response = TestRequest::post("/api/content/faq")
        .bearer(&setup.token)
        .json(&json!({ "question": "Who owns this?", "answer": "Not telling." }))
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 200);

    let config = setup.fetch_config().await;

    // The owning account and the private assistant prompt stay server-side
    assert!(config.get("owner_user_id").is_none());
    assert!(config.get("ownerUserId").is_none());
    assert!(config.get("chatbot_instructions").is_none());
    let item = &config["faq_items"].as_array().unwrap()[0];
    assert!(item.get("owner_user_id").is_none());
    assert!(item.get("ownerUserId").is_none());
}

// ============================================================================
// Cache invalidation
// ============================================================================

#[tokio::test]
async fn test_content_mutation_refreshes_cached_config() {
    let setup = ConfigSetup::new().await.expect("Setup failed");

    // Prime the cache with an empty collection
    let before = setup.fetch_config().await;
    assert!(before["faq_items"].as_array().unwrap().is_empty());

    let response = TestRequest::post("/api/content/faq")
        .bearer(&setup.token)
        .json(&json!({ "question": "Fresh?", "answer": "Within one poll." }))
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 200);

    let after = setup.fetch_config().await;
    assert_eq!(after["faq_items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_settings_save_refreshes_cached_config() {
    let setup = ConfigSetup::new().await.expect("Setup failed");

    let before = setup.fetch_config().await;
    assert_eq!(before["widget_color"], "blue");

    let response = TestRequest::put("/api/widget")
        .bearer(&setup.token)
        .json(&json!({
            "displayName": "Acme Support",
            "widgetColor": "green",
            "backgroundType": "gradient",
        }))
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 200);

    let after = setup.fetch_config().await;
    assert_eq!(after["widget_color"], "green");
}
