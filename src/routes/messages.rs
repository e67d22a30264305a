// ABOUTME: Messaging relay route handlers for the embedded chat thread
// ABOUTME: Visitor send/poll/clear plus the owner reply endpoint, all token- or JWT-gated

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Messaging relay routes
//!
//! Visitors hold an opaque capability token minted when their conversation is
//! created; every subsequent call must present it. Owners authenticate with a
//! bearer JWT. Validation and authorization run before any write.

use crate::auth;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{ChatMessage, MessageSender, WidgetConfiguration};
use crate::resources::ServerResources;
use crate::routes::authenticate;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to append a visitor message
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Public widget id
    pub widget_id: String,
    /// Browser-generated visitor identifier
    pub visitor_id: String,
    /// Message text
    pub message: String,
    /// Optional visitor display name shown in the dashboard
    #[serde(default)]
    pub visitor_name: Option<String>,
    /// Capability token returned when the conversation was created
    #[serde(default)]
    pub visitor_token: Option<String>,
    /// Client-generated key that makes retried sends idempotent
    #[serde(default)]
    pub client_key: Option<String>,
}

/// Response for a visitor send
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// Always true on 200
    pub success: bool,
    /// Conversation the message belongs to
    pub conversation_id: Uuid,
    /// Stored message id
    pub message_id: Uuid,
    /// Present only when this call created the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_token: Option<String>,
    /// Present when the chatbot produced a reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_message: Option<MessageView>,
}

/// Query parameters for the incremental poll
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    /// Public widget id
    pub widget_id: String,
    /// Browser-generated visitor identifier
    pub visitor_id: String,
    /// Capability token for the conversation
    #[serde(default)]
    pub visitor_token: Option<String>,
    /// Cursor; only messages created strictly after it are returned
    #[serde(default)]
    pub last_message_id: Option<String>,
}

/// Response for the poll endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    /// Ordered messages, oldest first
    pub messages: Vec<MessageView>,
    /// Null until the visitor's first send creates a conversation
    pub conversation_id: Option<Uuid>,
}

/// Request to clear the visitor's view of a conversation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    /// Public widget id
    pub widget_id: String,
    /// Browser-generated visitor identifier
    pub visitor_id: String,
    /// Capability token for the conversation
    #[serde(default)]
    pub visitor_token: Option<String>,
}

/// Request for an owner reply from the dashboard
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    /// Conversation to reply into
    pub conversation_id: String,
    /// Message text
    pub message: String,
    /// Client-generated key that makes retried sends idempotent
    #[serde(default)]
    pub client_key: Option<String>,
}

/// Response for an owner reply
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResponse {
    /// Always true on 200
    pub success: bool,
    /// Stored message id
    pub message_id: Uuid,
}

/// Single message in wire shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    /// Message id, also usable as a poll cursor
    pub id: Uuid,
    /// Author role
    pub sender: MessageSender,
    /// Message text
    pub content: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            sender: message.sender,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Messaging relay routes implementation
pub struct MessageRoutes;

impl MessageRoutes {
    /// Create all messaging relay routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/messages", post(Self::send_message))
            .route("/api/chat/messages", get(Self::get_messages))
            .route("/api/chat/clear", post(Self::clear_chat))
            .route("/api/chat/reply", post(Self::send_reply))
            .with_state(resources)
    }

    /// Append a visitor message, creating the conversation on first contact
    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        let text = validate_message_text(&request.message)?;
        let visitor_id = request.visitor_id.trim();
        if visitor_id.is_empty() {
            return Err(AppError::invalid_input("visitorId must not be empty"));
        }

        let widget = resolve_widget(&resources, &request.widget_id).await?;
        let owner = widget.owner_user_id;

        let existing = resources
            .database
            .get_conversation_by_visitor(owner, visitor_id)
            .await?;
        let was_existing = existing.is_some();

        let (conversation, minted_token) = match existing {
            Some(conversation) => {
                if !auth::visitor_token_matches(
                    request.visitor_token.as_deref(),
                    &conversation.visitor_token_hash,
                ) {
                    return Err(AppError::forbidden(
                        "Visitor token does not match this conversation",
                    ));
                }
                (conversation, None)
            }
            None => {
                let token = auth::mint_visitor_token();
                let conversation = resources
                    .database
                    .create_conversation(
                        owner,
                        widget.id,
                        visitor_id,
                        request.visitor_name.as_deref(),
                        &auth::hash_visitor_token(&token),
                    )
                    .await?;
                debug!(
                    conversation_id = %conversation.id,
                    "Created conversation for first visitor message"
                );
                (conversation, Some(token))
            }
        };

        // Retried sends carrying a known client key return the original row.
        if let Some(key) = request.client_key.as_deref() {
            if let Some(stored) = resources
                .database
                .find_message_by_client_key(conversation.id, key)
                .await?
            {
                return Ok((
                    StatusCode::OK,
                    Json(SendMessageResponse {
                        success: true,
                        conversation_id: conversation.id,
                        message_id: stored.id,
                        visitor_token: minted_token,
                        ai_message: None,
                    }),
                )
                    .into_response());
            }
        }

        let message = resources
            .database
            .append_message(
                conversation.id,
                MessageSender::Visitor,
                text,
                request.client_key.as_deref(),
            )
            .await?;

        if was_existing {
            if let Some(name) = request.visitor_name.as_deref() {
                let name = name.trim();
                if !name.is_empty() {
                    resources
                        .database
                        .update_visitor_name(conversation.id, name)
                        .await?;
                }
            }
        }

        let ai_message = if widget.chatbot_enabled {
            generate_ai_reply(&resources, &widget, conversation.id).await
        } else {
            None
        };

        Ok((
            StatusCode::OK,
            Json(SendMessageResponse {
                success: true,
                conversation_id: conversation.id,
                message_id: message.id,
                visitor_token: minted_token,
                ai_message: ai_message.map(MessageView::from),
            }),
        )
            .into_response())
    }

    /// Return the conversation history, optionally sliced by a cursor
    ///
    /// A visitor with no conversation yet gets an empty result, not an error.
    async fn get_messages(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<MessagesQuery>,
    ) -> Result<Response, AppError> {
        let widget = resolve_widget(&resources, &query.widget_id).await?;

        let Some(conversation) = resources
            .database
            .get_conversation_by_visitor(widget.owner_user_id, query.visitor_id.trim())
            .await?
        else {
            return Ok((
                StatusCode::OK,
                Json(MessagesResponse {
                    messages: Vec::new(),
                    conversation_id: None,
                }),
            )
                .into_response());
        };

        if !auth::visitor_token_matches(
            query.visitor_token.as_deref(),
            &conversation.visitor_token_hash,
        ) {
            return Err(AppError::forbidden(
                "Visitor token does not match this conversation",
            ));
        }

        let messages =
            fetch_messages(&resources, conversation.id, query.last_message_id.as_deref()).await?;

        Ok((
            StatusCode::OK,
            Json(MessagesResponse {
                messages: messages.into_iter().map(MessageView::from).collect(),
                conversation_id: Some(conversation.id),
            }),
        )
            .into_response())
    }

    /// Flag the conversation cleared for the visitor's widget view
    async fn clear_chat(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ClearRequest>,
    ) -> Result<Response, AppError> {
        let widget = resolve_widget(&resources, &request.widget_id).await?;

        let conversation = resources
            .database
            .get_conversation_by_visitor(widget.owner_user_id, request.visitor_id.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if !auth::visitor_token_matches(
            request.visitor_token.as_deref(),
            &conversation.visitor_token_hash,
        ) {
            return Err(AppError::forbidden(
                "Visitor token does not match this conversation",
            ));
        }

        resources
            .database
            .clear_conversation(conversation.id)
            .await?;

        Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response())
    }

    /// Append an owner reply from the dashboard
    ///
    /// Replying never touches the unread counter; that counts visitor
    /// messages awaiting the owner.
    async fn send_reply(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ReplyRequest>,
    ) -> Result<Response, AppError> {
        let owner = authenticate(&headers, &resources)?;
        let text = validate_message_text(&request.message)?;

        let conversation_id = Uuid::parse_str(request.conversation_id.trim())
            .map_err(|_| AppError::not_found("Conversation"))?;
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

        if let Some(key) = request.client_key.as_deref() {
            if let Some(stored) = resources
                .database
                .find_message_by_client_key(conversation.id, key)
                .await?
            {
                return Ok((
                    StatusCode::OK,
                    Json(ReplyResponse {
                        success: true,
                        message_id: stored.id,
                    }),
                )
                    .into_response());
            }
        }

        let message = resources
            .database
            .append_message(
                conversation.id,
                MessageSender::Owner,
                text,
                request.client_key.as_deref(),
            )
            .await?;

        Ok((
            StatusCode::OK,
            Json(ReplyResponse {
                success: true,
                message_id: message.id,
            }),
        )
            .into_response())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reject empty and oversized message text before any lookup or write
fn validate_message_text(raw: &str) -> Result<&str, AppError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::invalid_input("Message must not be empty"));
    }
    if text.chars().count() > limits::MAX_MESSAGE_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Message exceeds {} characters",
            limits::MAX_MESSAGE_LENGTH
        )));
    }
    Ok(text)
}

/// Resolve a widget from its public id; malformed ids read as absent
async fn resolve_widget(
    resources: &Arc<ServerResources>,
    raw_id: &str,
) -> AppResult<WidgetConfiguration> {
    let widget_id =
        Uuid::parse_str(raw_id.trim()).map_err(|_| AppError::not_found("Widget"))?;
    resources
        .database
        .get_widget_by_id(widget_id)
        .await?
        .ok_or_else(|| AppError::not_found("Widget"))
}

/// Full history, or the strictly-after slice when the cursor resolves
///
/// Unknown cursors fall back to full history so stale clients recover.
async fn fetch_messages(
    resources: &Arc<ServerResources>,
    conversation_id: Uuid,
    cursor: Option<&str>,
) -> AppResult<Vec<ChatMessage>> {
    if let Some(raw) = cursor {
        if let Ok(message_id) = Uuid::parse_str(raw.trim()) {
            if let Some(anchor) = resources
                .database
                .get_message_in_conversation(conversation_id, message_id)
                .await?
            {
                return resources
                    .database
                    .get_messages_after(conversation_id, anchor.created_at)
                    .await;
            }
        }
    }
    resources.database.get_messages(conversation_id).await
}

/// Best-effort assistant reply; failures degrade to no AI message
async fn generate_ai_reply(
    resources: &Arc<ServerResources>,
    widget: &WidgetConfiguration,
    conversation_id: Uuid,
) -> Option<ChatMessage> {
    let history = match resources.database.get_messages(conversation_id).await {
        Ok(history) => history,
        Err(e) => {
            warn!("Skipping AI reply, history unavailable: {e}");
            return None;
        }
    };

    let reply = match resources
        .assistant
        .generate_reply(
            widget.chatbot_instructions.as_deref(),
            widget.display_name.as_deref(),
            &history,
        )
        .await
    {
        Ok(Some(reply)) => reply,
        Ok(None) => return None,
        Err(e) => {
            warn!("Assistant reply failed: {e}");
            return None;
        }
    };

    match resources
        .database
        .append_message(conversation_id, MessageSender::Ai, &reply, None)
        .await
    {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("Failed to store AI reply: {e}");
            None
        }
    }
}
