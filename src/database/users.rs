// ABOUTME: Owner account database operations
// ABOUTME: Handles lazy account creation on first login and profile lookups
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_users(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                created_at DATETIME NOT NULL,
                last_login_at DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, display_name, created_at, last_login_at
            FROM users WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, display_name, created_at, last_login_at
            FROM users WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Fetch the account for an email, creating it on first login
    ///
    /// Also stamps `last_login_at`, since this is only called after a
    /// successful code verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_or_create_user(&self, email: &str) -> AppResult<User> {
        let now = Utc::now();

        if let Some(mut user) = self.get_user_by_email(email).await? {
            sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
                .bind(now)
                .bind(user.id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to update last login: {e}")))?;
            user.last_login_at = Some(now);
            return Ok(user);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            display_name: None,
            created_at: now,
            last_login_at: Some(now),
        };

        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        Ok(user)
    }

    /// Convert a database row to a `User`
    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> AppResult<User> {
        let id: String = row.get("id");
        Ok(User {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt user id: {e}")))?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            last_login_at: row.get::<Option<DateTime<Utc>>, _>("last_login_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;

    #[tokio::test]
    async fn test_get_or_create_is_stable_for_email() {
        let db = create_test_db().await.unwrap();

        let first = db.get_or_create_user("owner@example.com").await.unwrap();
        let second = db.get_or_create_user("owner@example.com").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "owner@example.com");
        assert!(second.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_lookup_unknown_email() {
        let db = create_test_db().await.unwrap();
        assert!(db.get_user_by_email("ghost@example.com").await.unwrap().is_none());
    }
}
