// ABOUTME: Billing provider client resolving an owner's subscription tier
// ABOUTME: Looks up the customer by email, then scans active subscriptions for pro products

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::config::environment::BillingProviderConfig;
use crate::errors::{AppError, AppResult};
use crate::models::PlanTier;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CustomerList {
    data: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionList {
    data: Vec<Subscription>,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    items: SubscriptionItems,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItems {
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: Price,
}

#[derive(Debug, Deserialize)]
struct Price {
    product: String,
}

/// Client for the billing provider
pub struct BillingClient {
    config: BillingProviderConfig,
    http_client: reqwest::Client,
}

impl BillingClient {
    /// Create a new billing client
    #[must_use]
    pub fn new(config: BillingProviderConfig, timeout_secs: u64) -> Self {
        Self {
            config,
            http_client: super::create_client_with_timeout(timeout_secs),
        }
    }

    /// Whether a secret key is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.secret_key.is_some()
    }

    /// Resolve the plan tier and raw status for an account email
    ///
    /// Unconfigured deployments resolve everyone to the free tier. The caller
    /// decides how to handle provider failures; this method reports them.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or replies with an
    /// error status or unparseable payload
    pub async fn plan_for_email(&self, email: &str) -> AppResult<(PlanTier, String)> {
        let Some(secret_key) = &self.config.secret_key else {
            debug!("Billing provider not configured, resolving free tier");
            return Ok((PlanTier::Free, "none".to_owned()));
        };

        let Some(customer_id) = self.find_customer(email, secret_key).await? else {
            return Ok((PlanTier::Free, "none".to_owned()));
        };

        let subscriptions = self.active_subscriptions(&customer_id, secret_key).await?;
        if subscriptions.is_empty() {
            return Ok((PlanTier::Free, "none".to_owned()));
        }

        let has_pro_product = subscriptions.iter().any(|subscription| {
            subscription.items.data.iter().any(|item| {
                self.config
                    .pro_product_ids
                    .iter()
                    .any(|id| id == &item.price.product)
            })
        });

        let tier = if has_pro_product {
            PlanTier::Pro
        } else {
            PlanTier::Free
        };
        Ok((tier, "active".to_owned()))
    }

    async fn find_customer(&self, email: &str, secret_key: &str) -> AppResult<Option<String>> {
        let url = format!("{}/customers", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(secret_key)
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::dependency("Billing provider", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::dependency(
                "Billing provider",
                format!("Customer lookup returned HTTP {}", response.status()),
            ));
        }

        let customers: CustomerList = response.json().await.map_err(|e| {
            AppError::dependency("Billing provider", format!("Malformed customer list: {e}"))
        })?;

        Ok(customers.data.into_iter().next().map(|c| c.id))
    }

    async fn active_subscriptions(
        &self,
        customer_id: &str,
        secret_key: &str,
    ) -> AppResult<Vec<Subscription>> {
        let url = format!("{}/subscriptions", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(secret_key)
            .query(&[("customer", customer_id), ("status", "active"), ("limit", "10")])
            .send()
            .await
            .map_err(|e| AppError::dependency("Billing provider", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::dependency(
                "Billing provider",
                format!("Subscription lookup returned HTTP {}", response.status()),
            ));
        }

        let subscriptions: SubscriptionList = response.json().await.map_err(|e| {
            AppError::dependency(
                "Billing provider",
                format!("Malformed subscription list: {e}"),
            )
        })?;

        Ok(subscriptions.data)
    }
}
