// ABOUTME: Email verification code database operations
// ABOUTME: At most one live code per email; older codes die on reissue
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::VerificationCode;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the verification codes table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_verification(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS verification_codes (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                code TEXT NOT NULL,
                expires_at DATETIME NOT NULL,
                used BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_verification_codes_email ON verification_codes(email)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a fresh login code, retiring any still-active code for the email
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_verification_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<VerificationCode> {
        sqlx::query("UPDATE verification_codes SET used = 1 WHERE email = $1 AND used = 0")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to retire old codes: {e}")))?;

        let record = VerificationCode {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            code: code.to_owned(),
            expires_at,
            used: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO verification_codes (id, email, code, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, 0, $5)
            ",
        )
        .bind(record.id.to_string())
        .bind(&record.email)
        .bind(&record.code)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store verification code: {e}")))?;

        Ok(record)
    }

    /// Latest unused, unexpired code for an email
    ///
    /// The caller compares the submitted code in constant time; this lookup
    /// deliberately never filters on the code value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn fetch_active_code(&self, email: &str) -> AppResult<Option<VerificationCode>> {
        let row = sqlx::query(
            r"
            SELECT * FROM verification_codes
            WHERE email = $1 AND used = 0 AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch verification code: {e}")))?;

        row.map(|r| Self::row_to_code(&r)).transpose()
    }

    /// Burn a code after a successful verify
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn mark_code_used(&self, code_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE verification_codes SET used = 1 WHERE id = $1")
            .bind(code_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to mark code used: {e}")))?;
        Ok(())
    }

    fn row_to_code(row: &sqlx::sqlite::SqliteRow) -> AppResult<VerificationCode> {
        let id: String = row.get("id");
        Ok(VerificationCode {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt code id: {e}")))?,
            email: row.get("email"),
            code: row.get("code"),
            expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
            used: row.get("used"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_reissue_retires_previous_code() {
        let db = create_test_db().await.unwrap();
        let expires = Utc::now() + Duration::minutes(10);

        db.create_verification_code("owner@example.com", "111111", expires)
            .await
            .unwrap();
        db.create_verification_code("owner@example.com", "222222", expires)
            .await
            .unwrap();

        let active = db.fetch_active_code("owner@example.com").await.unwrap().unwrap();
        assert_eq!(active.code, "222222");
    }

    #[tokio::test]
    async fn test_used_and_expired_codes_are_invisible() {
        let db = create_test_db().await.unwrap();

        let expired = Utc::now() - Duration::minutes(1);
        db.create_verification_code("late@example.com", "333333", expired)
            .await
            .unwrap();
        assert!(db.fetch_active_code("late@example.com").await.unwrap().is_none());

        let live = db
            .create_verification_code("owner@example.com", "444444", Utc::now() + Duration::minutes(10))
            .await
            .unwrap();
        db.mark_code_used(live.id).await.unwrap();
        assert!(db.fetch_active_code("owner@example.com").await.unwrap().is_none());
    }
}
