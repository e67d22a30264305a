// ABOUTME: Transactional email client for login verification codes
// ABOUTME: Unconfigured deployments log the code so local login still works

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::config::environment::EmailProviderConfig;
use crate::constants::limits::VERIFICATION_CODE_TTL_MINUTES;
use crate::errors::{AppError, AppResult};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Client for the transactional email provider
pub struct EmailClient {
    config: EmailProviderConfig,
    http_client: reqwest::Client,
}

impl EmailClient {
    /// Create a new email client
    #[must_use]
    pub fn new(config: EmailProviderConfig, timeout_secs: u64) -> Self {
        Self {
            config,
            http_client: super::create_client_with_timeout(timeout_secs),
        }
    }

    /// Whether an API key is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Deliver a login code to an owner's inbox
    ///
    /// Without an API key the code is written to the log instead, which keeps
    /// development logins working against an empty environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the send or is unreachable
    pub async fn send_login_code(&self, to: &str, code: &str) -> AppResult<()> {
        let Some(api_key) = &self.config.api_key else {
            warn!("Email provider not configured, logging code instead of sending");
            info!(email = %to, code = %code, "Login code issued");
            return Ok(());
        };

        let request = SendEmailRequest {
            from: &self.config.from_address,
            to: [to],
            subject: "Your Widjet login code",
            html: format!(
                "<p>Your login code is <strong>{code}</strong>.</p>\
                 <p>It expires in {VERIFICATION_CODE_TTL_MINUTES} minutes. \
                 If you did not request it, you can ignore this email.</p>"
            ),
        };

        let url = format!("{}/emails", self.config.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::dependency("Email provider", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::dependency(
                "Email provider",
                format!("Send returned HTTP {status}: {body}"),
            ));
        }

        info!(email = %to, "Login code email sent");
        Ok(())
    }
}
