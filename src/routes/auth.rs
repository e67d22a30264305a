// ABOUTME: Email-code authentication routes for widget owners
// ABOUTME: Code request/verification, JWT issuance, and the current-user endpoint

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Authentication routes
//!
//! Owners log in with a 6-digit code sent by email. `request-code` answers
//! 200 whether or not the email has an account, so the endpoint cannot be
//! used to enumerate accounts. Verifying a code creates the account on first
//! login and returns a bearer JWT.

use crate::auth::{codes_match, generate_login_code};
use crate::constants::limits;
use crate::errors::AppError;
use crate::models::User;
use crate::resources::ServerResources;
use crate::routes::authenticate;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request for a login code
#[derive(Debug, Deserialize)]
pub struct RequestCodeRequest {
    /// Email to send the code to
    pub email: String,
}

/// Request to exchange a code for a session token
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    /// Email the code was sent to
    pub email: String,
    /// Six-digit code from the email
    pub code: String,
}

/// Response for a successful verification
#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    /// Bearer JWT for dashboard calls
    pub token: String,
    /// The authenticated account
    pub user: UserView,
}

/// Account fields exposed to the dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// Account id
    pub id: uuid::Uuid,
    /// Login email
    pub email: String,
    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/request-code", post(Self::request_code))
            .route("/api/auth/verify-code", post(Self::verify_code))
            .route("/api/auth/me", get(Self::me))
            .with_state(resources)
    }

    /// Issue a login code, retiring any earlier unused code for the email
    ///
    /// Answers 200 regardless of account existence or email delivery
    /// outcome; delivery failures are logged server-side only.
    async fn request_code(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RequestCodeRequest>,
    ) -> Result<Response, AppError> {
        let email = normalize_email(&request.email)?;

        let code = generate_login_code();
        let expires_at = Utc::now() + Duration::minutes(limits::VERIFICATION_CODE_TTL_MINUTES);
        resources
            .database
            .create_verification_code(&email, &code, expires_at)
            .await?;

        if let Err(e) = resources.email.send_login_code(&email, &code).await {
            warn!("Login code email failed: {e}");
        }

        Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response())
    }

    /// Exchange a valid code for a bearer JWT, creating the account on first login
    async fn verify_code(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<VerifyCodeRequest>,
    ) -> Result<Response, AppError> {
        let email = normalize_email(&request.email)?;
        let submitted = request.code.trim();
        if submitted.is_empty() {
            return Err(AppError::invalid_input("Code must not be empty"));
        }

        let active = resources
            .database
            .fetch_active_code(&email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid or expired code"))?;

        if !codes_match(submitted, &active.code) {
            return Err(AppError::auth_invalid("Invalid or expired code"));
        }

        resources.database.mark_code_used(active.id).await?;
        let user = resources.database.get_or_create_user(&email).await?;
        let token = resources.auth_manager.generate_token(&user)?;

        info!(user_id = %user.id, "Owner logged in");

        Ok((
            StatusCode::OK,
            Json(VerifyCodeResponse {
                token,
                user: UserView::from(user),
            }),
        )
            .into_response())
    }

    /// Return the account behind the presented bearer token
    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;

        let user = resources
            .database
            .get_user(owner.user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Account no longer exists"))?;

        Ok((StatusCode::OK, Json(UserView::from(user))).into_response())
    }
}

/// Lowercase and sanity-check an email address
///
/// Only a shape check; deliverability is the email provider's concern.
fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::invalid_input("A valid email address is required"));
    }
    Ok(email)
}
