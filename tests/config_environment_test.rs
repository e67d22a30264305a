// ABOUTME: Integration tests for environment-driven configuration loading
// ABOUTME: Env var precedence, defaults, and startup validation failures

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::uninlined_format_args)]

use serial_test::serial;
use widjet_server::config::environment::{DatabaseUrl, Environment, LogLevel, ServerConfig};

/// Every variable `from_env` reads; cleared around each test
const CONFIG_VARS: &[&str] = &[
    "HTTP_PORT",
    "BASE_URL",
    "RUST_LOG",
    "ENVIRONMENT",
    "DATABASE_URL",
    "JWT_SECRET",
    "JWT_EXPIRY_HOURS",
    "CORS_ALLOWED_ORIGINS",
    "POLL_INTERVAL_MS",
    "CONFIG_CACHE_TTL_SECS",
    "PROVIDER_TIMEOUT_SECS",
    "BILLING_API_BASE",
    "BILLING_SECRET_KEY",
    "BILLING_PRO_PRODUCT_IDS",
    "EMAIL_API_BASE",
    "EMAIL_API_KEY",
    "EMAIL_FROM_ADDRESS",
    "SCRAPER_API_BASE",
    "SCRAPER_API_KEY",
    "ASSISTANT_API_BASE",
    "ASSISTANT_API_KEY",
    "ASSISTANT_MODEL",
    "SITE_BUILDER_WEBHOOK_SECRET",
];

/// Run `from_env` with exactly the given variables set
fn load_with_env(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
    for key in CONFIG_VARS {
        std::env::remove_var(key);
    }
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = ServerConfig::from_env();
    for key in CONFIG_VARS {
        std::env::remove_var(key);
    }
    result
}

#[test]
#[serial]
fn test_defaults_apply_when_nothing_is_set() {
    let config = load_with_env(&[]).expect("defaults must load");

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.base_url, "http://localhost:8080");
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.environment, Environment::Development);
    assert!(!config.database.url.is_memory());
    assert_eq!(config.auth.jwt_expiry_hours, 24);
    assert_eq!(config.cors.allowed_origins, "*");
    assert_eq!(config.widget.poll_interval_ms, 5_000);
    assert_eq!(config.widget.config_cache_ttl_secs, 30);
    assert!(config.providers.billing.secret_key.is_none());
    assert!(config.providers.assistant.api_key.is_none());
    assert!(config.webhook.site_builder_secret.is_none());
}

#[test]
#[serial]
fn test_env_vars_override_defaults() {
    let config = load_with_env(&[
        ("HTTP_PORT", "9001"),
        ("BASE_URL", "https://widjet.example.com"),
        ("RUST_LOG", "debug"),
        ("ENVIRONMENT", "testing"),
        ("DATABASE_URL", "sqlite::memory:"),
        ("POLL_INTERVAL_MS", "2500"),
        ("SITE_BUILDER_WEBHOOK_SECRET", "whsec_abc"),
        ("BILLING_PRO_PRODUCT_IDS", "prod_a, prod_b"),
    ])
    .expect("overrides must load");

    assert_eq!(config.http_port, 9001);
    assert_eq!(config.base_url, "https://widjet.example.com");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.environment, Environment::Testing);
    assert!(config.database.url.is_memory());
    assert_eq!(config.widget.poll_interval_ms, 2500);
    assert_eq!(
        config.webhook.site_builder_secret.as_deref(),
        Some("whsec_abc")
    );
    assert_eq!(
        config.providers.billing.pro_product_ids,
        vec!["prod_a", "prod_b"]
    );
}

#[test]
#[serial]
fn test_unparseable_port_fails_startup() {
    let result = load_with_env(&[("HTTP_PORT", "not-a-port")]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_unsupported_database_kind_fails_startup() {
    let result = load_with_env(&[("DATABASE_URL", "postgresql://db.internal/widjet")]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_production_requires_a_real_jwt_secret() {
    let result = load_with_env(&[("ENVIRONMENT", "production")]);
    assert!(result.is_err(), "default secret must not pass in production");

    let config = load_with_env(&[
        ("ENVIRONMENT", "production"),
        ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
    ])
    .expect("a strong secret must pass");
    assert!(config.environment.is_production());
}

#[test]
#[serial]
fn test_invalid_base_url_fails_startup() {
    let result = load_with_env(&[("BASE_URL", "not a url at all")]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_bare_path_database_url_reads_as_sqlite_file() {
    let config = load_with_env(&[("DATABASE_URL", "./data/custom.db")]).expect("must load");

    assert!(matches!(config.database.url, DatabaseUrl::SQLite { .. }));
    assert_eq!(
        config.database.url.to_connection_string(),
        "sqlite:./data/custom.db"
    );
}
