// ABOUTME: Content collection CRUD routes for the widget builder
// ABOUTME: FAQ, product, Instagram, and link management plus drag-and-drop reorder

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Content collection routes
//!
//! One route family serves all four collections; the path segment picks the
//! collection and the handlers dispatch on it. Every mutation invalidates
//! the owner's cached widget payload so embedded widgets pick up changes
//! within one poll cycle.

use crate::database::ContentCollection;
use crate::errors::AppError;
use crate::models::{CustomLink, FaqItem, InstagramPost, ProductCard};
use crate::resources::ServerResources;
use crate::routes::{
    authenticate, normalize_optional, required_text, required_url, validate_optional_url,
};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Item fields for create and update calls
///
/// One shape covers all four collections; the handler enforces which fields
/// the addressed collection requires.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemRequest {
    /// FAQ question text
    #[serde(default)]
    pub question: Option<String>,
    /// FAQ answer text
    #[serde(default)]
    pub answer: Option<String>,
    /// Product title
    #[serde(default)]
    pub title: Option<String>,
    /// Product description
    #[serde(default)]
    pub description: Option<String>,
    /// Product or Instagram image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Product display price, free-form text
    #[serde(default)]
    pub price: Option<String>,
    /// Product click-through URL
    #[serde(default)]
    pub link_url: Option<String>,
    /// Instagram caption
    #[serde(default)]
    pub caption: Option<String>,
    /// Instagram post URL
    #[serde(default)]
    pub post_url: Option<String>,
    /// Link button label
    #[serde(default)]
    pub label: Option<String>,
    /// Link button target URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Request to apply a new display order
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Item ids in the desired order, first id gets index 0
    pub ids: Vec<String>,
}

/// FAQ entry in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqItemView {
    /// Item id
    pub id: Uuid,
    /// Question text
    pub question: String,
    /// Answer text
    pub answer: String,
    /// Display position, ascending
    pub sort_index: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<FaqItem> for FaqItemView {
    fn from(item: FaqItem) -> Self {
        Self {
            id: item.id,
            question: item.question,
            answer: item.answer,
            sort_index: item.sort_index,
            created_at: item.created_at,
        }
    }
}

/// Product card in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCardView {
    /// Item id
    pub id: Uuid,
    /// Product title
    pub title: String,
    /// Short description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Display price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Click-through URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// Display position, ascending
    pub sort_index: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<ProductCard> for ProductCardView {
    fn from(card: ProductCard) -> Self {
        Self {
            id: card.id,
            title: card.title,
            description: card.description,
            image_url: card.image_url,
            price: card.price,
            link_url: card.link_url,
            sort_index: card.sort_index,
            created_at: card.created_at,
        }
    }
}

/// Instagram post in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPostView {
    /// Item id
    pub id: Uuid,
    /// Post image URL
    pub image_url: String,
    /// Post caption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Link to the original post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    /// Display position, ascending
    pub sort_index: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<InstagramPost> for InstagramPostView {
    fn from(post: InstagramPost) -> Self {
        Self {
            id: post.id,
            image_url: post.image_url,
            caption: post.caption,
            post_url: post.post_url,
            sort_index: post.sort_index,
            created_at: post.created_at,
        }
    }
}

/// Link button in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLinkView {
    /// Item id
    pub id: Uuid,
    /// Button label
    pub label: String,
    /// Target URL
    pub url: String,
    /// Display position, ascending
    pub sort_index: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<CustomLink> for CustomLinkView {
    fn from(link: CustomLink) -> Self {
        Self {
            id: link.id,
            label: link.label,
            url: link.url,
            sort_index: link.sort_index,
            created_at: link.created_at,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Content collection routes implementation
pub struct ContentRoutes;

impl ContentRoutes {
    /// Create all content collection routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/content/:collection", get(Self::list_items))
            .route("/api/content/:collection", post(Self::create_item))
            .route("/api/content/:collection/reorder", post(Self::reorder_items))
            .route("/api/content/:collection/:id", put(Self::update_item))
            .route("/api/content/:collection/:id", delete(Self::delete_item))
            .with_state(resources)
    }

    /// List the caller's items in display order
    async fn list_items(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(collection): Path<String>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let collection = parse_collection(&collection)?;

        let response = match collection {
            ContentCollection::Faq => {
                let items = resources.database.list_faq_items(owner.user_id).await?;
                Json(items.into_iter().map(FaqItemView::from).collect::<Vec<_>>()).into_response()
            }
            ContentCollection::Products => {
                let cards = resources.database.list_product_cards(owner.user_id).await?;
                Json(
                    cards
                        .into_iter()
                        .map(ProductCardView::from)
                        .collect::<Vec<_>>(),
                )
                .into_response()
            }
            ContentCollection::Instagram => {
                let posts = resources
                    .database
                    .list_instagram_posts(owner.user_id)
                    .await?;
                Json(
                    posts
                        .into_iter()
                        .map(InstagramPostView::from)
                        .collect::<Vec<_>>(),
                )
                .into_response()
            }
            ContentCollection::Links => {
                let links = resources.database.list_custom_links(owner.user_id).await?;
                Json(
                    links
                        .into_iter()
                        .map(CustomLinkView::from)
                        .collect::<Vec<_>>(),
                )
                .into_response()
            }
        };

        Ok(response)
    }

    /// Create an item at the end of the collection
    async fn create_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(collection): Path<String>,
        Json(request): Json<ContentItemRequest>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let collection = parse_collection(&collection)?;

        let response = match collection {
            ContentCollection::Faq => {
                let question = required_text(request.question, "question")?;
                let answer = required_text(request.answer, "answer")?;
                let item = resources
                    .database
                    .create_faq_item(owner.user_id, &question, &answer)
                    .await?;
                Json(FaqItemView::from(item)).into_response()
            }
            ContentCollection::Products => {
                let title = required_text(request.title, "title")?;
                let description = normalize_optional(request.description);
                let image_url = validate_optional_url(request.image_url, "imageUrl")?;
                let link_url = validate_optional_url(request.link_url, "linkUrl")?;
                let price = normalize_optional(request.price);
                let card = resources
                    .database
                    .create_product_card(
                        owner.user_id,
                        &title,
                        description.as_deref(),
                        image_url.as_deref(),
                        price.as_deref(),
                        link_url.as_deref(),
                    )
                    .await?;
                Json(ProductCardView::from(card)).into_response()
            }
            ContentCollection::Instagram => {
                let image_url = required_url(request.image_url, "imageUrl")?;
                let caption = normalize_optional(request.caption);
                let post_url = validate_optional_url(request.post_url, "postUrl")?;
                let post = resources
                    .database
                    .create_instagram_post(
                        owner.user_id,
                        &image_url,
                        caption.as_deref(),
                        post_url.as_deref(),
                    )
                    .await?;
                Json(InstagramPostView::from(post)).into_response()
            }
            ContentCollection::Links => {
                let label = required_text(request.label, "label")?;
                let url = required_url(request.url, "url")?;
                let link = resources
                    .database
                    .create_custom_link(owner.user_id, &label, &url)
                    .await?;
                Json(CustomLinkView::from(link)).into_response()
            }
        };

        invalidate_widget_cache(&resources, owner.user_id).await;
        Ok(response)
    }

    /// Replace an item's fields, keeping its position
    async fn update_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((collection, item_id)): Path<(String, String)>,
        Json(request): Json<ContentItemRequest>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let collection = parse_collection(&collection)?;
        let item_id = parse_item_id(&item_id)?;

        let response = match collection {
            ContentCollection::Faq => {
                let question = required_text(request.question, "question")?;
                let answer = required_text(request.answer, "answer")?;
                let item = resources
                    .database
                    .update_faq_item(owner.user_id, item_id, &question, &answer)
                    .await?
                    .ok_or_else(|| AppError::not_found("Item"))?;
                Json(FaqItemView::from(item)).into_response()
            }
            ContentCollection::Products => {
                let title = required_text(request.title, "title")?;
                let description = normalize_optional(request.description);
                let image_url = validate_optional_url(request.image_url, "imageUrl")?;
                let link_url = validate_optional_url(request.link_url, "linkUrl")?;
                let price = normalize_optional(request.price);
                let card = resources
                    .database
                    .update_product_card(
                        owner.user_id,
                        item_id,
                        &title,
                        description.as_deref(),
                        image_url.as_deref(),
                        price.as_deref(),
                        link_url.as_deref(),
                    )
                    .await?
                    .ok_or_else(|| AppError::not_found("Item"))?;
                Json(ProductCardView::from(card)).into_response()
            }
            ContentCollection::Instagram => {
                let image_url = required_url(request.image_url, "imageUrl")?;
                let caption = normalize_optional(request.caption);
                let post_url = validate_optional_url(request.post_url, "postUrl")?;
                let post = resources
                    .database
                    .update_instagram_post(
                        owner.user_id,
                        item_id,
                        &image_url,
                        caption.as_deref(),
                        post_url.as_deref(),
                    )
                    .await?
                    .ok_or_else(|| AppError::not_found("Item"))?;
                Json(InstagramPostView::from(post)).into_response()
            }
            ContentCollection::Links => {
                let label = required_text(request.label, "label")?;
                let url = required_url(request.url, "url")?;
                let link = resources
                    .database
                    .update_custom_link(owner.user_id, item_id, &label, &url)
                    .await?
                    .ok_or_else(|| AppError::not_found("Item"))?;
                Json(CustomLinkView::from(link)).into_response()
            }
        };

        invalidate_widget_cache(&resources, owner.user_id).await;
        Ok(response)
    }

    /// Delete an item the caller owns
    async fn delete_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((collection, item_id)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let collection = parse_collection(&collection)?;
        let item_id = parse_item_id(&item_id)?;

        let deleted = resources
            .database
            .delete_content_item(owner.user_id, collection, item_id)
            .await?;
        if !deleted {
            return Err(AppError::not_found("Item"));
        }

        invalidate_widget_cache(&resources, owner.user_id).await;
        Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response())
    }

    /// Reassign contiguous sort indices following the submitted id order
    async fn reorder_items(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(collection): Path<String>,
        Json(request): Json<ReorderRequest>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let collection = parse_collection(&collection)?;

        let ids = request
            .ids
            .iter()
            .map(|raw| Uuid::parse_str(raw.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AppError::invalid_input("ids must be item UUIDs"))?;

        resources
            .database
            .reorder_content(owner.user_id, collection, &ids)
            .await?;

        invalidate_widget_cache(&resources, owner.user_id).await;
        Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Map a path segment to a collection; unknown segments read as absent routes
fn parse_collection(raw: &str) -> Result<ContentCollection, AppError> {
    raw.parse::<ContentCollection>()
        .map_err(|_| AppError::not_found("Collection"))
}

/// Parse an item id path segment; malformed ids read as absent items
fn parse_item_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found("Item"))
}

/// Drop the owner's cached widget payload after a content mutation
///
/// Failures only delay freshness until the cache TTL runs out, so they log
/// instead of failing the mutation that already committed.
async fn invalidate_widget_cache(resources: &Arc<ServerResources>, owner_user_id: Uuid) {
    match resources.database.get_widget_by_owner(owner_user_id).await {
        Ok(Some(widget)) => resources.config_cache.invalidate(widget.id).await,
        Ok(None) => {}
        Err(e) => warn!("Widget lookup for cache invalidation failed: {e}"),
    }
}
