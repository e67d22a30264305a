// ABOUTME: Public config assembly endpoint consumed by the loader script
// ABOUTME: Merges the widget row with the owner's content collections, memoized per widget id

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::{AppError, AppResult};
use crate::models::AssembledWidgetConfig;
use crate::resources::ServerResources;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for config assembly
#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    /// Public widget id
    pub id: String,
}

/// Config assembly routes implementation
pub struct WidgetConfigRoutes;

impl WidgetConfigRoutes {
    /// Create the config assembly route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/widget-config", get(Self::get_config))
            .with_state(resources)
    }

    /// Assemble the public widget payload
    ///
    /// Malformed and unknown ids both map to NotFound; the loader treats
    /// them identically and the distinction would only help probing.
    async fn get_config(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ConfigQuery>,
    ) -> Result<Response, AppError> {
        let widget_id =
            Uuid::parse_str(query.id.trim()).map_err(|_| AppError::not_found("Widget"))?;

        if let Some(cached) = resources.config_cache.get(widget_id).await {
            return Ok((StatusCode::OK, Json(cached)).into_response());
        }

        let config = assemble_config(&resources, widget_id).await?;
        resources
            .config_cache
            .insert(widget_id, config.clone())
            .await;

        Ok((StatusCode::OK, Json(config)).into_response())
    }
}

/// Merge the widget row with the owner's content collections, each ordered
/// ascending by sort index
pub(crate) async fn assemble_config(
    resources: &Arc<ServerResources>,
    widget_id: Uuid,
) -> AppResult<AssembledWidgetConfig> {
    let widget = resources
        .database
        .get_widget_by_id(widget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Widget"))?;

    let owner = widget.owner_user_id;
    let faq_items = resources.database.list_faq_items(owner).await?;
    let product_cards = resources.database.list_product_cards(owner).await?;
    let instagram_posts = resources.database.list_instagram_posts(owner).await?;
    let custom_links = resources.database.list_custom_links(owner).await?;

    Ok(AssembledWidgetConfig {
        widget_id: widget.id,
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
        language: widget.language,
        whatsapp_number: widget.whatsapp_number,
        poll_interval_ms: resources.config.widget.poll_interval_ms,
        faq_items,
        product_cards,
        instagram_posts,
        custom_links,
    })
}
