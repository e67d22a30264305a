// ABOUTME: Widget configuration database operations
// ABOUTME: One configuration row per owner, addressed publicly by widget ID
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::WidgetConfiguration;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the widget configurations table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_widgets(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS widget_configurations (
                id TEXT PRIMARY KEY,
                owner_user_id TEXT UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                display_name TEXT,
                widget_color TEXT NOT NULL DEFAULT 'blue',
                is_dark_theme BOOLEAN NOT NULL DEFAULT 0,
                avatar_url TEXT,
                logo_url TEXT,
                background_type TEXT NOT NULL DEFAULT 'gradient',
                faq_enabled BOOLEAN NOT NULL DEFAULT 0,
                instagram_enabled BOOLEAN NOT NULL DEFAULT 0,
                whatsapp_enabled BOOLEAN NOT NULL DEFAULT 0,
                chatbot_enabled BOOLEAN NOT NULL DEFAULT 0,
                show_branding BOOLEAN NOT NULL DEFAULT 1,
                chatbot_instructions TEXT,
                language TEXT NOT NULL DEFAULT 'en',
                whatsapp_number TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_widget_configurations_owner ON widget_configurations(owner_user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a widget configuration by its public widget ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_widget_by_id(
        &self,
        widget_id: Uuid,
    ) -> AppResult<Option<WidgetConfiguration>> {
        let row = sqlx::query("SELECT * FROM widget_configurations WHERE id = $1")
            .bind(widget_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get widget: {e}")))?;

        row.map(|r| Self::row_to_widget(&r)).transpose()
    }

    /// Get the widget configuration owned by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_widget_by_owner(
        &self,
        owner_user_id: Uuid,
    ) -> AppResult<Option<WidgetConfiguration>> {
        let row = sqlx::query("SELECT * FROM widget_configurations WHERE owner_user_id = $1")
            .bind(owner_user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get widget by owner: {e}")))?;

        row.map(|r| Self::row_to_widget(&r)).transpose()
    }

    /// Insert or update the owner's widget configuration
    ///
    /// The public widget ID is assigned on first save and never changes
    /// afterwards, so embed snippets stay valid across edits. Returns the
    /// canonical stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn upsert_widget(
        &self,
        widget: &WidgetConfiguration,
    ) -> AppResult<WidgetConfiguration> {
        sqlx::query(
            r"
            INSERT INTO widget_configurations (
                id, owner_user_id, display_name, widget_color, is_dark_theme,
                avatar_url, logo_url, background_type, faq_enabled, instagram_enabled,
                whatsapp_enabled, chatbot_enabled, show_branding, chatbot_instructions,
                language, whatsapp_number, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT(owner_user_id) DO UPDATE SET
                display_name = excluded.display_name,
                widget_color = excluded.widget_color,
                is_dark_theme = excluded.is_dark_theme,
                avatar_url = excluded.avatar_url,
                logo_url = excluded.logo_url,
                background_type = excluded.background_type,
                faq_enabled = excluded.faq_enabled,
                instagram_enabled = excluded.instagram_enabled,
                whatsapp_enabled = excluded.whatsapp_enabled,
                chatbot_enabled = excluded.chatbot_enabled,
                show_branding = excluded.show_branding,
                chatbot_instructions = excluded.chatbot_instructions,
                language = excluded.language,
                whatsapp_number = excluded.whatsapp_number,
                updated_at = excluded.updated_at
            ",
        )
        .bind(widget.id.to_string())
        .bind(widget.owner_user_id.to_string())
        .bind(&widget.display_name)
        .bind(&widget.widget_color)
        .bind(widget.is_dark_theme)
        .bind(&widget.avatar_url)
        .bind(&widget.logo_url)
        .bind(&widget.background_type)
        .bind(widget.faq_enabled)
        .bind(widget.instagram_enabled)
        .bind(widget.whatsapp_enabled)
        .bind(widget.chatbot_enabled)
        .bind(widget.show_branding)
        .bind(&widget.chatbot_instructions)
        .bind(&widget.language)
        .bind(&widget.whatsapp_number)
        .bind(widget.created_at)
        .bind(widget.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save widget: {e}")))?;

        self.get_widget_by_owner(widget.owner_user_id)
            .await?
            .ok_or_else(|| AppError::database("Widget disappeared after save".to_owned()))
    }

    /// Convert a database row to a `WidgetConfiguration`
    fn row_to_widget(row: &sqlx::sqlite::SqliteRow) -> AppResult<WidgetConfiguration> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_user_id");
        Ok(WidgetConfiguration {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt widget id: {e}")))?,
            owner_user_id: Uuid::parse_str(&owner)
                .map_err(|e| AppError::database(format!("Corrupt widget owner id: {e}")))?,
            display_name: row.get("display_name"),
            widget_color: row.get("widget_color"),
            is_dark_theme: row.get("is_dark_theme"),
            avatar_url: row.get("avatar_url"),
            logo_url: row.get("logo_url"),
            background_type: row.get("background_type"),
            faq_enabled: row.get("faq_enabled"),
            instagram_enabled: row.get("instagram_enabled"),
            whatsapp_enabled: row.get("whatsapp_enabled"),
            chatbot_enabled: row.get("chatbot_enabled"),
            show_branding: row.get("show_branding"),
            chatbot_instructions: row.get("chatbot_instructions"),
            language: row.get("language"),
            whatsapp_number: row.get("whatsapp_number"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use crate::models::WidgetConfiguration;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_upsert_preserves_public_id() {
        let db = create_test_db().await.unwrap();
        let owner = db.get_or_create_user("owner@example.com").await.unwrap();

        let now = Utc::now();
        let first = WidgetConfiguration {
            id: Uuid::new_v4(),
            owner_user_id: owner.id,
            display_name: Some("Acme Support".to_owned()),
            widget_color: "teal".to_owned(),
            is_dark_theme: false,
            avatar_url: None,
            logo_url: None,
            background_type: "gradient".to_owned(),
            faq_enabled: true,
            instagram_enabled: false,
            whatsapp_enabled: false,
            chatbot_enabled: false,
            show_branding: true,
            chatbot_instructions: None,
            language: "en".to_owned(),
            whatsapp_number: None,
            created_at: now,
            updated_at: now,
        };
        let saved = db.upsert_widget(&first).await.unwrap();
        assert_eq!(saved.id, first.id);

        let edited = WidgetConfiguration {
            id: Uuid::new_v4(),
            widget_color: "pink".to_owned(),
            updated_at: Utc::now(),
            ..first.clone()
        };
        let resaved = db.upsert_widget(&edited).await.unwrap();

        assert_eq!(resaved.id, first.id, "widget ID must survive edits");
        assert_eq!(resaved.widget_color, "pink");

        let by_id = db.get_widget_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(by_id.widget_color, "pink");
    }
}
