// ABOUTME: HTTP integration tests for the site-builder webhook receiver
// ABOUTME: Signature verification over raw bytes and the unconfigured fallback

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::uninlined_format_args)]

mod common;
mod helpers;

use helpers::axum_test::TestRequest;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use widjet_server::server::build_router;

const SIGNATURE_HEADER: &str = "x-widjet-signature";

/// Hex HMAC-SHA256 signature the site builder would attach
fn sign(secret: &str, body: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// ============================================================================
// POST /webhooks/site-builder
// ============================================================================

#[tokio::test]
async fn test_signed_install_event_is_accepted() {
    let resources = common::create_test_resources().await.expect("Setup failed");
    let body = r#"{"event":"install","siteId":"site-42"}"#;

    let response = TestRequest::post("/webhooks/site-builder")
        .header(SIGNATURE_HEADER, &sign(common::TEST_WEBHOOK_SECRET, body))
        .body(body)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.json()["success"], true);
}

#[tokio::test]
async fn test_unknown_event_kinds_are_still_acknowledged() {
    let resources = common::create_test_resources().await.expect("Setup failed");
    let body = r#"{"event":"site.renamed","siteId":"site-42"}"#;

    let response = TestRequest::post("/webhooks/site-builder")
        .header(SIGNATURE_HEADER, &sign(common::TEST_WEBHOOK_SECRET, body))
        .body(body)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let resources = common::create_test_resources().await.expect("Setup failed");
    let signature = sign(
        common::TEST_WEBHOOK_SECRET,
        r#"{"event":"install","siteId":"site-42"}"#,
    );

    let response = TestRequest::post("/webhooks/site-builder")
        .header(SIGNATURE_HEADER, &signature)
        .body(r#"{"event":"uninstall","siteId":"site-42"}"#)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(response.json()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_signature_from_wrong_secret_is_rejected() {
    let resources = common::create_test_resources().await.expect("Setup failed");
    let body = r#"{"event":"install","siteId":"site-42"}"#;

    let response = TestRequest::post("/webhooks/site-builder")
        .header(SIGNATURE_HEADER, &sign("whsec_some_other_secret", body))
        .body(body)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_missing_signature_header_is_rejected() {
    let resources = common::create_test_resources().await.expect("Setup failed");

    let response = TestRequest::post("/webhooks/site-builder")
        .body(r#"{"event":"install"}"#)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_malformed_payload_with_valid_signature_is_invalid() {
    let resources = common::create_test_resources().await.expect("Setup failed");
    let body = "this is not json";

    let response = TestRequest::post("/webhooks/site-builder")
        .header(SIGNATURE_HEADER, &sign(common::TEST_WEBHOOK_SECRET, body))
        .body(body)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(response.json()["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_unconfigured_secret_hides_the_endpoint() {
    let mut config = common::test_server_config();
    config.webhook.site_builder_secret = None;
    let resources = common::create_test_resources_with_config(config)
        .await
        .expect("Setup failed");
    let body = r#"{"event":"install"}"#;

    let response = TestRequest::post("/webhooks/site-builder")
        .header(SIGNATURE_HEADER, &sign(common::TEST_WEBHOOK_SECRET, body))
        .body(body)
        .send(build_router(&resources))
        .await;

    assert_eq!(response.status(), 404);
}
