// ABOUTME: Database management over SQLite
// ABOUTME: Owns the connection pool and fans out per-domain migrations
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Database Management
//!
//! Storage layer for the Widjet server: owner accounts, widget
//! configurations, content collections, conversations with their messages,
//! and verification codes. Each domain lives in its own file as an
//! `impl Database` block with its migration alongside its queries.

mod content;
mod conversations;
mod users;
mod verification;
mod widgets;

pub use content::ContentCollection;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for all persistent state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_widgets().await?;
        self.migrate_content().await?;
        self.migrate_conversations().await?;
        self.migrate_verification().await?;
        Ok(())
    }
}
