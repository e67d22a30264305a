// ABOUTME: Subscription status route for the dashboard billing panel
// ABOUTME: Provider plan lookup plus the rolling monthly AI usage count

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use crate::models::{PlanTier, SubscriptionStatus};
use crate::resources::ServerResources;
use crate::routes::authenticate;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// Response Types
// ============================================================================

/// Subscription state in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    /// Resolved plan tier
    pub plan: PlanTier,
    /// Raw provider status, `active` or `none`
    pub status: String,
    /// AI replies consumed since the start of the current month, UTC
    pub ai_messages_used: i64,
    /// Monthly allowance for the resolved tier
    pub ai_message_limit: i64,
    /// Usage is at or past 80% of the allowance
    pub approaching_limit: bool,
    /// Usage has reached the allowance
    pub at_limit: bool,
}

impl From<SubscriptionStatus> for SubscriptionView {
    fn from(status: SubscriptionStatus) -> Self {
        Self {
            plan: status.plan,
            status: status.status,
            ai_messages_used: status.ai_messages_used,
            ai_message_limit: status.ai_message_limit,
            approaching_limit: status.approaching_limit,
            at_limit: status.at_limit,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Billing routes implementation
pub struct BillingRoutes;

impl BillingRoutes {
    /// Create the subscription status route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/billing/subscription", get(Self::subscription))
            .with_state(resources)
    }

    /// Resolve the caller's plan and current-month AI usage
    ///
    /// Nothing here is cached; the dashboard polls this rarely and the
    /// numbers must reflect the latest provider state. A provider outage
    /// maps the caller to the free tier instead of failing the panel.
    async fn subscription(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;

        let (plan, status) = match resources.billing.plan_for_email(&owner.email).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Billing provider lookup failed, defaulting to free tier: {e}");
                (PlanTier::Free, "none".to_owned())
            }
        };

        let used = resources
            .database
            .count_ai_messages_since(owner.user_id, current_month_start(Utc::now()))
            .await?;

        let view = SubscriptionView::from(SubscriptionStatus::from_usage(plan, status, used));
        Ok((StatusCode::OK, Json(view)).into_response())
    }
}

/// First instant of the month containing `now`, UTC
fn current_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
