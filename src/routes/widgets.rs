// ABOUTME: Owner-facing widget configuration routes backing the builder UI
// ABOUTME: Fetch and upsert of the single per-owner WidgetConfiguration row

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::constants::{defaults, palette};
use crate::errors::AppError;
use crate::models::WidgetConfiguration;
use crate::resources::ServerResources;
use crate::routes::{authenticate, normalize_optional, validate_optional_url};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to save the owner's widget configuration
///
/// The save is a full replacement; absent fields fall back to product
/// defaults, matching how the builder submits its form state.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWidgetRequest {
    /// Name shown in the widget header
    #[serde(default)]
    pub display_name: Option<String>,
    /// Accent color token from the fixed palette
    #[serde(default)]
    pub widget_color: Option<String>,
    /// Dark theme toggle
    #[serde(default)]
    pub is_dark_theme: bool,
    /// Chat avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Brand logo image URL
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Panel background style, `gradient` or `solid`
    #[serde(default)]
    pub background_type: Option<String>,
    /// FAQ section toggle
    #[serde(default)]
    pub faq_enabled: bool,
    /// Instagram section toggle
    #[serde(default)]
    pub instagram_enabled: bool,
    /// WhatsApp hand-off toggle
    #[serde(default)]
    pub whatsapp_enabled: bool,
    /// AI auto-reply toggle
    #[serde(default)]
    pub chatbot_enabled: bool,
    /// Whether the "powered by" badge renders
    #[serde(default = "default_show_branding")]
    pub show_branding: bool,
    /// Extra system prompt text for the chatbot
    #[serde(default)]
    pub chatbot_instructions: Option<String>,
    /// Widget UI language code
    #[serde(default)]
    pub language: Option<String>,
    /// Number for the WhatsApp hand-off button
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

const fn default_show_branding() -> bool {
    true
}

/// Widget configuration in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    /// Public widget id, the value owners embed in their pages
    pub id: Uuid,
    /// Name shown in the widget header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Accent color token
    pub widget_color: String,
    /// Dark theme toggle
    pub is_dark_theme: bool,
    /// Chat avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Brand logo image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Panel background style
    pub background_type: String,
    /// FAQ section toggle
    pub faq_enabled: bool,
    /// Instagram section toggle
    pub instagram_enabled: bool,
    /// WhatsApp hand-off toggle
    pub whatsapp_enabled: bool,
    /// AI auto-reply toggle
    pub chatbot_enabled: bool,
    /// Whether the "powered by" badge renders
    pub show_branding: bool,
    /// Extra system prompt text for the chatbot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chatbot_instructions: Option<String>,
    /// Widget UI language code
    pub language: String,
    /// Number for the WhatsApp hand-off button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last save time
    pub updated_at: DateTime<Utc>,
}

impl From<WidgetConfiguration> for WidgetView {
    fn from(widget: WidgetConfiguration) -> Self {
        Self {
            id: widget.id,
            display_name: widget.display_name,
            widget_color: widget.widget_color,
            is_dark_theme: widget.is_dark_theme,
            avatar_url: widget.avatar_url,
            logo_url: widget.logo_url,
            background_type: widget.background_type,
            faq_enabled: widget.faq_enabled,
            instagram_enabled: widget.instagram_enabled,
            whatsapp_enabled: widget.whatsapp_enabled,
            chatbot_enabled: widget.chatbot_enabled,
            show_branding: widget.show_branding,
            chatbot_instructions: widget.chatbot_instructions,
            language: widget.language,
            whatsapp_number: widget.whatsapp_number,
            created_at: widget.created_at,
            updated_at: widget.updated_at,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Widget configuration routes implementation
pub struct WidgetRoutes;

impl WidgetRoutes {
    /// Create the widget configuration routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/widget", get(Self::get_widget))
            .route("/api/widget", put(Self::save_widget))
            .with_state(resources)
    }

    /// Fetch the caller's widget configuration
    ///
    /// The row is created on first save, so a fresh account reads NotFound
    /// until onboarding completes.
    async fn get_widget(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;

        let widget = resources
            .database
            .get_widget_by_owner(owner.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Widget"))?;

        Ok((StatusCode::OK, Json(WidgetView::from(widget))).into_response())
    }

    /// Create or replace the caller's widget configuration
    async fn save_widget(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SaveWidgetRequest>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;

        let widget_color = match request.widget_color.as_deref().map(str::trim) {
            None | Some("") => defaults::WIDGET_COLOR.to_owned(),
            Some(token) => {
                if !palette::WIDGET_COLORS.iter().any(|(name, _)| *name == token) {
                    return Err(AppError::invalid_input(format!(
                        "Unknown widget color '{token}'"
                    )));
                }
                token.to_owned()
            }
        };

        let background_type = match request.background_type.as_deref().map(str::trim) {
            None | Some("") => defaults::BACKGROUND_TYPE.to_owned(),
            Some(style @ ("gradient" | "solid")) => style.to_owned(),
            Some(other) => {
                return Err(AppError::invalid_input(format!(
                    "Unknown background type '{other}'"
                )));
            }
        };

        let language = match request.language.as_deref().map(str::trim) {
            None | Some("") => defaults::LANGUAGE.to_owned(),
            Some(code) => code.to_lowercase(),
        };

        let now = Utc::now();
        let widget = WidgetConfiguration {
            // Placeholder id; the upsert keeps the existing public id on update.
            id: Uuid::new_v4(),
            owner_user_id: owner.user_id,
            display_name: normalize_optional(request.display_name),
            widget_color,
            is_dark_theme: request.is_dark_theme,
            avatar_url: validate_optional_url(request.avatar_url, "avatarUrl")?,
            logo_url: validate_optional_url(request.logo_url, "logoUrl")?,
            background_type,
            faq_enabled: request.faq_enabled,
            instagram_enabled: request.instagram_enabled,
            whatsapp_enabled: request.whatsapp_enabled,
            chatbot_enabled: request.chatbot_enabled,
            show_branding: request.show_branding,
            chatbot_instructions: normalize_optional(request.chatbot_instructions),
            language,
            whatsapp_number: normalize_optional(request.whatsapp_number),
            created_at: now,
            updated_at: now,
        };

        let saved = resources.database.upsert_widget(&widget).await?;
        resources.config_cache.invalidate(saved.id).await;

        info!(widget_id = %saved.id, "Widget configuration saved");

        Ok((StatusCode::OK, Json(WidgetView::from(saved))).into_response())
    }
}
