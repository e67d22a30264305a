// ABOUTME: HTTP integration tests for widget content collections
// ABOUTME: CRUD, validation, reordering and cross-account isolation

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

struct ContentSetup {
    resources: Arc<ServerResources>,
    token: String,
}

impl ContentSetup {
    async fn new() -> anyhow::Result<Self> {
        let resources = common::create_test_resources().await?;
        let (_, token) = common::create_owner(&resources, "owner@example.com").await?;
        Ok(Self { resources, token })
    }

    fn app(&self) -> axum::Router {
        build_router(&self.resources)
    }

    async fn create_faq(&self, question: &str) -> serde_json::Value {
        let response = TestRequest::post("/api/content/faq")
            .bearer(&self.token)
            .json(&json!({ "question": question, "answer": "Because." }))
            .send(self.app())
            .await;
        assert_eq!(response.status(), 200);
        response.json()
    }
}

// ============================================================================
// Create & List
// ============================================================================

#[tokio::test]
async fn test_faq_create_assigns_next_sort_index() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    let first = setup.create_faq("What is this?").await;
    let second = setup.create_faq("How much?").await;

    assert_eq!(first["sortIndex"], 0);
    assert_eq!(second["sortIndex"], 1);
    assert_eq!(first["question"], "What is this?");
    assert!(first["id"].is_string());
    assert!(first.get("ownerUserId").is_none());

    let list = TestRequest::get("/api/content/faq")
        .bearer(&setup.token)
        .send(setup.app())
        .await;
    assert_eq!(list.status(), 200);
    let items = list.json();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["question"], "What is this?");
}

#[tokio::test]
async fn test_product_create_with_full_fields() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    let response = TestRequest::post("/api/content/products")
        .bearer(&setup.token)
        .json(&json!({
            "title": "Espresso Blend",
            "description": "Dark roast, 250g",
            "price": "$14",
            "imageUrl": "https://cdn.example.com/espresso.jpg",
            "linkUrl": "https://shop.example.com/espresso",
        }))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 200);
    let card = response.json();
    assert_eq!(card["title"], "Espresso Blend");
    assert_eq!(card["price"], "$14");
    assert_eq!(card["imageUrl"], "https://cdn.example.com/espresso.jpg");
}

#[tokio::test]
async fn test_instagram_requires_image_url() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    let missing = TestRequest::post("/api/content/instagram")
        .bearer(&setup.token)
        .json(&json!({ "caption": "no image" }))
        .send(setup.app())
        .await;
    assert_eq!(missing.status(), 400);

    let valid = TestRequest::post("/api/content/instagram")
        .bearer(&setup.token)
        .json(&json!({ "imageUrl": "https://cdn.example.com/post.jpg" }))
        .send(setup.app())
        .await;
    assert_eq!(valid.status(), 200);
}

#[tokio::test]
async fn test_link_requires_label_and_url() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    let response = TestRequest::post("/api/content/links")
        .bearer(&setup.token)
        .json(&json!({ "label": "Book a table" }))
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 400);

    let valid = TestRequest::post("/api/content/links")
        .bearer(&setup.token)
        .json(&json!({ "label": "Book a table", "url": "https://example.com/book" }))
        .send(setup.app())
        .await;
    assert_eq!(valid.status(), 200);
    assert_eq!(valid.json()["label"], "Book a table");
}

#[tokio::test]
async fn test_faq_requires_question_and_answer() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    for payload in [
        json!({ "answer": "just an answer" }),
        json!({ "question": "   ", "answer": "blank question" }),
        json!({}),
    ] {
        let response = TestRequest::post("/api/content/faq")
            .bearer(&setup.token)
            .json(&payload)
            .send(setup.app())
            .await;
        assert_eq!(response.status(), 400, "payload {payload}");
    }
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    let response = TestRequest::get("/api/content/recipes")
        .bearer(&setup.token)
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_content_requires_auth() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    let response = TestRequest::get("/api/content/faq").send(setup.app()).await;
    assert_eq!(response.status(), 401);
}

// ============================================================================
// Update & Delete
// ============================================================================

#[tokio::test]
async fn test_update_replaces_fields_and_keeps_position() {
    let setup = ContentSetup::new().await.expect("Setup failed");
    setup.create_faq("First").await;
    let item = setup.create_faq("Second").await;
    let item_id = item["id"].as_str().unwrap();

    let response = TestRequest::put(&format!("/api/content/faq/{item_id}"))
        .bearer(&setup.token)
        .json(&json!({ "question": "Second, edited", "answer": "New answer" }))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 200);
    let updated = response.json();
    assert_eq!(updated["question"], "Second, edited");
    assert_eq!(updated["sortIndex"], 1);
}

#[tokio::test]
async fn test_update_missing_item_is_not_found() {
    let setup = ContentSetup::new().await.expect("Setup failed");

    for item_id in [uuid::Uuid::new_v4().to_string(), "garbage".into()] {
        let response = TestRequest::put(&format!("/api/content/faq/{item_id}"))
            .bearer(&setup.token)
            .json(&json!({ "question": "q", "answer": "a" }))
            .send(setup.app())
            .await;
        assert_eq!(response.status(), 404, "item id {item_id}");
    }
}

#[tokio::test]
async fn test_delete_removes_item() {
    let setup = ContentSetup::new().await.expect("Setup failed");
    let item = setup.create_faq("Disposable").await;
    let item_id = item["id"].as_str().unwrap();

    let response = TestRequest::delete(&format!("/api/content/faq/{item_id}"))
        .bearer(&setup.token)
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json()["success"], true);

    let list = TestRequest::get("/api/content/faq")
        .bearer(&setup.token)
        .send(setup.app())
        .await
        .json();
    assert_eq!(list.as_array().unwrap().len(), 0);

    let again = TestRequest::delete(&format!("/api/content/faq/{item_id}"))
        .bearer(&setup.token)
        .send(setup.app())
        .await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_items_are_isolated_per_account() {
    let setup = ContentSetup::new().await.expect("Setup failed");
    let item = setup.create_faq("Mine").await;
    let item_id = item["id"].as_str().unwrap();

    let (_, intruder_token) = common::create_owner(&setup.resources, "intruder@example.com")
        .await
        .expect("owner setup failed");

    // Another account neither sees nor edits nor deletes the item
    let list = TestRequest::get("/api/content/faq")
        .bearer(&intruder_token)
        .send(setup.app())
        .await
        .json();
    assert_eq!(list.as_array().unwrap().len(), 0);

    let update = TestRequest::put(&format!("/api/content/faq/{item_id}"))
        .bearer(&intruder_token)
        .json(&json!({ "question": "Stolen", "answer": "!" }))
        .send(setup.app())
        .await;
    assert_eq!(update.status(), 404);

    let delete = TestRequest::delete(&format!("/api/content/faq/{item_id}"))
        .bearer(&intruder_token)
        .send(setup.app())
        .await;
    assert_eq!(delete.status(), 404);
}

// ============================================================================
// POST /api/content/:collection/reorder
// ============================================================================

#[tokio::test]
async fn test_reorder_rewrites_sort_indexes() {
    let setup = ContentSetup::new().await.expect("Setup failed");
    let a = setup.create_faq("A").await;
    let b = setup.create_faq("B").await;
    let c = setup.create_faq("C").await;

    let response = TestRequest::post("/api/content/faq/reorder")
        .bearer(&setup.token)
        .json(&json!({ "ids": [c["id"], a["id"], b["id"]] }))
        .send(setup.app())
        .await;
    assert_eq!(response.status(), 200);

    let list = TestRequest::get("/api/content/faq")
        .bearer(&setup.token)
        .send(setup.app())
        .await
        .json();
    let questions: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["question"].as_str().unwrap())
        .collect();
    assert_eq!(questions, vec!["C", "A", "B"]);

    // Positions are contiguous from zero after any reorder
    let indexes: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["sortIndex"].as_i64().unwrap())
        .collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_reorder_rejects_malformed_ids() {
    let setup = ContentSetup::new().await.expect("Setup failed");
    setup.create_faq("Only").await;

    let response = TestRequest::post("/api/content/faq/reorder")
        .bearer(&setup.token)
        .json(&json!({ "ids": ["not-a-uuid"] }))
        .send(setup.app())
        .await;

    assert_eq!(response.status(), 400);
}
