// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides resource wiring, owner onboarding and widget creation helpers

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! Shared test utilities for `widjet_server`
//!
//! Common setup functions to reduce duplication across integration tests.
//! Every test gets its own in-memory database, so tests never observe each
//! other's state.

use anyhow::Result;
use chrono::Utc;
use std::sync::{Arc, Once};
use uuid::Uuid;
use widjet_server::{
    config::environment::{
        AssistantProviderConfig, AuthConfig, BillingProviderConfig, CorsConfig, DatabaseConfig,
        DatabaseUrl, EmailProviderConfig, Environment, LogLevel, ProvidersConfig,
        ScraperProviderConfig, ServerConfig, WebhookConfig, WidgetDeliveryConfig,
    },
    database::Database,
    models::{User, WidgetConfiguration},
    resources::ServerResources,
};

/// Shared secret used by the webhook tests
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_shared_secret";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration for tests: in-memory storage, providers unconfigured
///
/// Providers carry no API keys, so billing resolves the free tier, the
/// assistant skips auto-replies and login codes land in the log instead
/// of an inbox. Tests that need other behavior adjust the returned value.
pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        http_port: 8081,
        base_url: "http://localhost:8081".into(),
        log_level: LogLevel::default(),
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-jwt-secret-0123".into(),
            jwt_expiry_hours: 24,
        },
        cors: CorsConfig {
            allowed_origins: "*".into(),
        },
        widget: WidgetDeliveryConfig {
            poll_interval_ms: 5_000,
            config_cache_ttl_secs: 30,
        },
        providers: ProvidersConfig {
            timeout_secs: 5,
            billing: BillingProviderConfig {
                base_url: "https://api.stripe.com/v1".into(),
                secret_key: None,
                pro_product_ids: vec!["prod_pro".into()],
            },
            email: EmailProviderConfig {
                base_url: "https://api.resend.com".into(),
                api_key: None,
                from_address: "Widjet <login@widjet.test>".into(),
            },
            scraper: ScraperProviderConfig {
                base_url: "https://api.microlink.io".into(),
                api_key: None,
            },
            assistant: AssistantProviderConfig {
                base_url: "https://api.openai.com/v1".into(),
                api_key: None,
                model: "gpt-4o-mini".into(),
            },
        },
        webhook: WebhookConfig {
            site_builder_secret: Some(TEST_WEBHOOK_SECRET.into()),
        },
    }
}

/// Standard test resource setup with a fresh in-memory database
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    create_test_resources_with_config(test_server_config()).await
}

/// Test resource setup with a caller-adjusted configuration
pub async fn create_test_resources_with_config(
    config: ServerConfig,
) -> Result<Arc<ServerResources>> {
    init_test_logging();
    let database = Database::new("sqlite::memory:").await?;
    Ok(Arc::new(ServerResources::new(database, Arc::new(config))))
}

/// Create an owner account and a valid dashboard session token for it
pub async fn create_owner(
    resources: &Arc<ServerResources>,
    email: &str,
) -> Result<(User, String)> {
    let user = resources.database.get_or_create_user(email).await?;
    let token = resources.auth_manager.generate_token(&user)?;
    Ok((user, token))
}

/// Create a widget for an owner with chat enabled and all sections on
pub async fn create_widget(
    resources: &Arc<ServerResources>,
    owner_user_id: Uuid,
) -> Result<WidgetConfiguration> {
    let now = Utc::now();
    let widget = WidgetConfiguration {
        id: Uuid::new_v4(),
        owner_user_id,
        display_name: Some("Acme Support".into()),
        widget_color: "blue".into(),
        is_dark_theme: false,
        avatar_url: None,
        logo_url: None,
        background_type: "gradient".into(),
        faq_enabled: true,
        instagram_enabled: true,
        whatsapp_enabled: false,
        chatbot_enabled: true,
        show_branding: true,
        chatbot_instructions: None,
        language: "en".into(),
        whatsapp_number: None,
        created_at: now,
        updated_at: now,
    };
    Ok(resources.database.upsert_widget(&widget).await?)
}
