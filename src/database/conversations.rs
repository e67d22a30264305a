// ABOUTME: Conversation and chat message database operations
// ABOUTME: Backs the visitor relay, owner dashboard and AI usage metering
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ChatMessage, Conversation, MessageSender};
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// Characters of message text cached on the conversation row
const PREVIEW_LENGTH: usize = 120;

impl Database {
    /// Create the conversations and chat messages tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_conversations(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                widget_id TEXT NOT NULL,
                visitor_id TEXT NOT NULL,
                visitor_name TEXT,
                visitor_token_hash TEXT NOT NULL,
                last_message_preview TEXT,
                last_message_at DATETIME,
                unread_count INTEGER NOT NULL DEFAULT 0,
                cleared BOOLEAN NOT NULL DEFAULT 0,
                cleared_at DATETIME,
                created_at DATETIME NOT NULL,
                UNIQUE(owner_user_id, visitor_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_owner_activity ON conversations(owner_user_id, last_message_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender TEXT NOT NULL CHECK (sender IN ('visitor', 'owner', 'ai')),
                content TEXT NOT NULL,
                client_key TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation ON chat_messages(conversation_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        // Retried sends carrying the same client key must not duplicate rows
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_chat_messages_client_key
            ON chat_messages(conversation_id, client_key)
            WHERE client_key IS NOT NULL
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ================================================================
    // Conversations
    // ================================================================

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_conversation(
        &self,
        conversation_id: Uuid,
    ) -> AppResult<Option<Conversation>> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = $1")
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.map(|r| Self::row_to_conversation(&r)).transpose()
    }

    /// Get the conversation a visitor holds with an owner, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_conversation_by_visitor(
        &self,
        owner_user_id: Uuid,
        visitor_id: &str,
    ) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE owner_user_id = $1 AND visitor_id = $2",
        )
        .bind(owner_user_id.to_string())
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.map(|r| Self::row_to_conversation(&r)).transpose()
    }

    /// Create a conversation for a visitor's first message
    ///
    /// Stores only the token digest. The raw token never touches disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_conversation(
        &self,
        owner_user_id: Uuid,
        widget_id: Uuid,
        visitor_id: &str,
        visitor_name: Option<&str>,
        visitor_token_hash: &str,
    ) -> AppResult<Conversation> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            owner_user_id,
            widget_id,
            visitor_id: visitor_id.to_owned(),
            visitor_name: visitor_name.map(ToOwned::to_owned),
            visitor_token_hash: visitor_token_hash.to_owned(),
            last_message_preview: None,
            last_message_at: None,
            unread_count: 0,
            cleared: false,
            cleared_at: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO conversations (
                id, owner_user_id, widget_id, visitor_id, visitor_name,
                visitor_token_hash, unread_count, cleared, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7)
            ",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.owner_user_id.to_string())
        .bind(conversation.widget_id.to_string())
        .bind(&conversation.visitor_id)
        .bind(&conversation.visitor_name)
        .bind(&conversation.visitor_token_hash)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(conversation)
    }

    /// Record the name a visitor supplied after the conversation started
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_visitor_name(
        &self,
        conversation_id: Uuid,
        visitor_name: &str,
    ) -> AppResult<()> {
        sqlx::query("UPDATE conversations SET visitor_name = $1 WHERE id = $2")
            .bind(visitor_name)
            .bind(conversation_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update visitor name: {e}")))?;
        Ok(())
    }

    /// Mark a conversation cleared from the visitor's widget view
    ///
    /// History stays queryable; the flag is a visibility hint.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn clear_conversation(&self, conversation_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE conversations SET cleared = 1, cleared_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(conversation_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear conversation: {e}")))?;
        Ok(())
    }

    /// List an owner's conversations, most recently active first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_conversations_for_owner(
        &self,
        owner_user_id: Uuid,
    ) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM conversations
            WHERE owner_user_id = $1
            ORDER BY last_message_at IS NULL, last_message_at DESC
            ",
        )
        .bind(owner_user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    /// Reset the unread counter; `false` when the conversation does not
    /// exist or belongs to another owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn mark_conversation_read(
        &self,
        owner_user_id: Uuid,
        conversation_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE conversations SET unread_count = 0 WHERE id = $1 AND owner_user_id = $2",
        )
        .bind(conversation_id.to_string())
        .bind(owner_user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark conversation read: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    // ================================================================
    // Messages
    // ================================================================

    /// Append a message and refresh the conversation's last-message cache
    ///
    /// Visitor messages bump the unread counter; owner and AI messages do
    /// not. A retried send whose client key already exists returns the
    /// stored message instead of inserting a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        sender: MessageSender,
        content: &str,
        client_key: Option<&str>,
    ) -> AppResult<ChatMessage> {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender,
            content: content.to_owned(),
            client_key: client_key.map(ToOwned::to_owned),
            created_at: Utc::now(),
        };

        let insert = sqlx::query(
            r"
            INSERT INTO chat_messages (id, conversation_id, sender, content, client_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender.as_str())
        .bind(&message.content)
        .bind(&message.client_key)
        .bind(message.created_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = insert {
            // Concurrent retry raced us to the same client key
            let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if duplicate {
                if let Some(key) = client_key {
                    if let Some(existing) =
                        self.find_message_by_client_key(conversation_id, key).await?
                    {
                        return Ok(existing);
                    }
                }
            }
            return Err(AppError::database(format!("Failed to append message: {e}")));
        }

        let preview: String = message.content.chars().take(PREVIEW_LENGTH).collect();
        let unread_bump = i64::from(sender == MessageSender::Visitor);
        sqlx::query(
            r"
            UPDATE conversations
            SET last_message_preview = $1, last_message_at = $2,
                unread_count = unread_count + $3
            WHERE id = $4
            ",
        )
        .bind(&preview)
        .bind(message.created_at)
        .bind(unread_bump)
        .bind(conversation_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation cache: {e}")))?;

        Ok(message)
    }

    /// Look up a previously stored message by its idempotency key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn find_message_by_client_key(
        &self,
        conversation_id: Uuid,
        client_key: &str,
    ) -> AppResult<Option<ChatMessage>> {
        let row = sqlx::query(
            "SELECT * FROM chat_messages WHERE conversation_id = $1 AND client_key = $2",
        )
        .bind(conversation_id.to_string())
        .bind(client_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to look up client key: {e}")))?;

        row.map(|r| Self::row_to_message(&r)).transpose()
    }

    /// Full message history in creation order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_messages(&self, conversation_id: Uuid) -> AppResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE conversation_id = $1 ORDER BY created_at ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// Messages created strictly after the cursor timestamp, in order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_messages_after(
        &self,
        conversation_id: Uuid,
        after: DateTime<Utc>,
    ) -> AppResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM chat_messages
            WHERE conversation_id = $1 AND created_at > $2
            ORDER BY created_at ASC
            ",
        )
        .bind(conversation_id.to_string())
        .bind(after)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages after cursor: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// Resolve a cursor message, scoped to its conversation so foreign
    /// message IDs never act as cursors
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_message_in_conversation(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> AppResult<Option<ChatMessage>> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE id = $1 AND conversation_id = $2")
            .bind(message_id.to_string())
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to resolve cursor: {e}")))?;

        row.map(|r| Self::row_to_message(&r)).transpose()
    }

    /// AI messages across the owner's conversations since a point in time
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_ai_messages_since(
        &self,
        owner_user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS total
            FROM chat_messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE c.owner_user_id = $1 AND m.sender = 'ai' AND m.created_at >= $2
            ",
        )
        .bind(owner_user_id.to_string())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count AI messages: {e}")))?;

        Ok(row.get::<i64, _>("total"))
    }

    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> AppResult<Conversation> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_user_id");
        let widget: String = row.get("widget_id");
        Ok(Conversation {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt conversation id: {e}")))?,
            owner_user_id: Uuid::parse_str(&owner)
                .map_err(|e| AppError::database(format!("Corrupt conversation owner id: {e}")))?,
            widget_id: Uuid::parse_str(&widget)
                .map_err(|e| AppError::database(format!("Corrupt conversation widget id: {e}")))?,
            visitor_id: row.get("visitor_id"),
            visitor_name: row.get("visitor_name"),
            visitor_token_hash: row.get("visitor_token_hash"),
            last_message_preview: row.get("last_message_preview"),
            last_message_at: row.get::<Option<DateTime<Utc>>, _>("last_message_at"),
            unread_count: row.get("unread_count"),
            cleared: row.get("cleared"),
            cleared_at: row.get::<Option<DateTime<Utc>>, _>("cleared_at"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> AppResult<ChatMessage> {
        let id: String = row.get("id");
        let conversation: String = row.get("conversation_id");
        let sender: String = row.get("sender");
        Ok(ChatMessage {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt message id: {e}")))?,
            conversation_id: Uuid::parse_str(&conversation)
                .map_err(|e| AppError::database(format!("Corrupt message conversation id: {e}")))?,
            sender: MessageSender::from_str(&sender)
                .map_err(|e| AppError::database(format!("Corrupt message sender: {e}")))?,
            content: row.get("content"),
            client_key: row.get("client_key"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}
