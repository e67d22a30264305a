// ABOUTME: Clients for the outbound provider integrations
// ABOUTME: Billing lookups, login-code email, site scraping and AI replies

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! External provider clients
//!
//! Every client here wraps one third-party HTTP API behind a domain-shaped
//! interface. All calls share a bounded timeout so a slow provider can only
//! delay a request, never hang it.

pub mod assistant;
pub mod billing;
pub mod email;
pub mod scraper;

pub use assistant::AssistantClient;
pub use billing::BillingClient;
pub use email::EmailClient;
pub use scraper::{validate_extraction_url, ScraperClient};

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Build a pooled HTTP client with request and connect timeouts
///
/// Falls back to a default client if custom configuration fails.
#[must_use]
pub(crate) fn create_client_with_timeout(timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(5)))
        .build()
        .unwrap_or_else(|_| Client::new())
}
