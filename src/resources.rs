// ABOUTME: Centralized resource container for dependency injection
// ABOUTME: One instance per server owns the database pool, auth and provider clients

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Server resource container
//!
//! Everything request handlers need hangs off one `Arc<ServerResources>`,
//! so expensive objects are built once at startup instead of per request.

use crate::auth::AuthManager;
use crate::cache::ConfigCache;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::external::{AssistantClient, BillingClient, EmailClient, ScraperClient};
use std::sync::Arc;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Database pool and domain operations
    pub database: Arc<Database>,
    /// Session token signing and validation
    pub auth_manager: Arc<AuthManager>,
    /// Assembled widget config memoization
    pub config_cache: Arc<ConfigCache>,
    /// Billing provider client
    pub billing: Arc<BillingClient>,
    /// Transactional email client
    pub email: Arc<EmailClient>,
    /// Site scraping client
    pub scraper: Arc<ScraperClient>,
    /// AI assistant client
    pub assistant: Arc<AssistantClient>,
    /// Full server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire up all shared resources from configuration
    #[must_use]
    pub fn new(database: Database, config: Arc<ServerConfig>) -> Self {
        let timeout_secs = config.providers.timeout_secs;
        let expiry_hours = i64::try_from(config.auth.jwt_expiry_hours).unwrap_or(i64::MAX);

        Self {
            database: Arc::new(database),
            auth_manager: Arc::new(AuthManager::new(&config.auth.jwt_secret, expiry_hours)),
            config_cache: Arc::new(ConfigCache::new(config.widget.config_cache_ttl_secs)),
            billing: Arc::new(BillingClient::new(
                config.providers.billing.clone(),
                timeout_secs,
            )),
            email: Arc::new(EmailClient::new(config.providers.email.clone(), timeout_secs)),
            scraper: Arc::new(ScraperClient::new(
                config.providers.scraper.clone(),
                timeout_secs,
            )),
            assistant: Arc::new(AssistantClient::new(
                config.providers.assistant.clone(),
                timeout_secs,
            )),
            config,
        }
    }
}
