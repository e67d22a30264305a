// ABOUTME: Dashboard conversation routes for widget owners
// ABOUTME: Inbox listing, per-thread history, and unread-counter reset

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use crate::models::Conversation;
use crate::resources::ServerResources;
use crate::routes::authenticate;
use crate::routes::messages::MessageView;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Response Types
// ============================================================================

/// Conversation summary in dashboard wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    /// Conversation id
    pub id: Uuid,
    /// Browser-generated visitor identifier
    pub visitor_id: String,
    /// Name the visitor supplied, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_name: Option<String>,
    /// Truncated text of the latest message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
    /// Time of the latest message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Visitor messages since the owner last opened the thread
    pub unread_count: i64,
    /// Conversation creation time
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationView {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            visitor_id: conversation.visitor_id,
            visitor_name: conversation.visitor_name,
            last_message_preview: conversation.last_message_preview,
            last_message_at: conversation.last_message_at,
            unread_count: conversation.unread_count,
            created_at: conversation.created_at,
        }
    }
}

/// Response for the owner-side thread fetch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResponse {
    /// Ordered messages, oldest first
    pub messages: Vec<MessageView>,
}

// ============================================================================
// Routes
// ============================================================================

/// Dashboard conversation routes implementation
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Create all dashboard conversation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/conversations", get(Self::list_conversations))
            .route("/api/conversations/:id/messages", get(Self::get_thread))
            .route("/api/conversations/:id/read", post(Self::mark_read))
            .with_state(resources)
    }

    /// List the caller's conversations, most recent activity first
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;

        let conversations = resources
            .database
            .list_conversations_for_owner(owner.user_id)
            .await?;
        let views: Vec<ConversationView> = conversations
            .into_iter()
            .map(ConversationView::from)
            .collect();

        Ok((StatusCode::OK, Json(views)).into_response())
    }

    /// Fetch a thread's full history for the dashboard reply view
    ///
    /// Owners always read full history; the visitor-side cleared flag does
    /// not hide anything here.
    async fn get_thread(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let conversation = resolve_owned(&resources, &owner, &conversation_id).await?;

        let messages = resources.database.get_messages(conversation.id).await?;

        Ok((
            StatusCode::OK,
            Json(ThreadResponse {
                messages: messages.into_iter().map(MessageView::from).collect(),
            }),
        )
            .into_response())
    }

    /// Reset the unread counter after the owner opens a thread
    async fn mark_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let conversation_id = Uuid::parse_str(conversation_id.trim())
            .map_err(|_| AppError::not_found("Conversation"))?;

        let updated = resources
            .database
            .mark_conversation_read(owner.user_id, conversation_id)
            .await?;
        if !updated {
            return Err(AppError::not_found("Conversation"));
        }

        Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response())
    }
}

/// Load a conversation and verify the caller owns it
async fn resolve_owned(
    resources: &Arc<ServerResources>,
    owner: &crate::routes::AuthenticatedOwner,
    raw_id: &str,
) -> Result<Conversation, AppError> {
    let conversation_id =
        Uuid::parse_str(raw_id.trim()).map_err(|_| AppError::not_found("Conversation"))?;
    let conversation = resources
        .database
        .get_conversation(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation"))?;
    if conversation.owner_user_id != owner.user_id {
        return Err(AppError::forbidden(
            "Conversation belongs to another account",
        ));
    }
    Ok(conversation)
}
