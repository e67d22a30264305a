// ABOUTME: Widget content database operations for FAQ, products, Instagram and links
// ABOUTME: All four collections share ownership checks, sort order and reorder handling
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{CustomLink, FaqItem, InstagramPost, ProductCard};
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// Which of the four widget content collections an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCollection {
    /// Question/answer pairs
    Faq,
    /// Product recommendation cards
    Products,
    /// Instagram feed posts
    Instagram,
    /// Arbitrary link buttons
    Links,
}

impl ContentCollection {
    /// Table backing this collection
    const fn table_name(self) -> &'static str {
        match self {
            Self::Faq => "faq_items",
            Self::Products => "product_cards",
            Self::Instagram => "instagram_posts",
            Self::Links => "custom_links",
        }
    }

    /// Path segment used in the dashboard API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Products => "products",
            Self::Instagram => "instagram",
            Self::Links => "links",
        }
    }
}

impl FromStr for ContentCollection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faq" => Ok(Self::Faq),
            "products" => Ok(Self::Products),
            "instagram" => Ok(Self::Instagram),
            "links" => Ok(Self::Links),
            _ => Err(AppError::invalid_input(format!("Unknown content collection: {s}")).into()),
        }
    }
}

impl Database {
    /// Create the four content tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_content(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS faq_items (
                id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                sort_index INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS product_cards (
                id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                price TEXT,
                link_url TEXT,
                sort_index INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS instagram_posts (
                id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                image_url TEXT NOT NULL,
                caption TEXT,
                post_url TEXT,
                sort_index INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS custom_links (
                id TEXT PRIMARY KEY,
                owner_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                label TEXT NOT NULL,
                url TEXT NOT NULL,
                sort_index INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        for table in [
            "faq_items",
            "product_cards",
            "instagram_posts",
            "custom_links",
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_owner_sort ON {table}(owner_user_id, sort_index)"
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    // ================================================================
    // FAQ items
    // ================================================================

    /// Create a FAQ item appended to the end of the owner's list
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_faq_item(
        &self,
        owner_user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> AppResult<FaqItem> {
        let item = FaqItem {
            id: Uuid::new_v4(),
            owner_user_id,
            question: question.to_owned(),
            answer: answer.to_owned(),
            sort_index: self
                .next_sort_index(ContentCollection::Faq, owner_user_id)
                .await?,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO faq_items (id, owner_user_id, question, answer, sort_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(item.id.to_string())
        .bind(item.owner_user_id.to_string())
        .bind(&item.question)
        .bind(&item.answer)
        .bind(item.sort_index)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create FAQ item: {e}")))?;

        Ok(item)
    }

    /// Update a FAQ item the owner holds; `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_faq_item(
        &self,
        owner_user_id: Uuid,
        item_id: Uuid,
        question: &str,
        answer: &str,
    ) -> AppResult<Option<FaqItem>> {
        let result = sqlx::query(
            "UPDATE faq_items SET question = $1, answer = $2 WHERE id = $3 AND owner_user_id = $4",
        )
        .bind(question)
        .bind(answer)
        .bind(item_id.to_string())
        .bind(owner_user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update FAQ item: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query("SELECT * FROM faq_items WHERE id = $1")
            .bind(item_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reload FAQ item: {e}")))?;
        Ok(Some(Self::row_to_faq(&row)?))
    }

    /// List the owner's FAQ items in display order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_faq_items(&self, owner_user_id: Uuid) -> AppResult<Vec<FaqItem>> {
        let rows = sqlx::query(
            "SELECT * FROM faq_items WHERE owner_user_id = $1 ORDER BY sort_index ASC, created_at ASC",
        )
        .bind(owner_user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list FAQ items: {e}")))?;

        rows.iter().map(Self::row_to_faq).collect()
    }

    // ================================================================
    // Product cards
    // ================================================================

    /// Create a product card appended to the end of the owner's list
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_product_card(
        &self,
        owner_user_id: Uuid,
        title: &str,
        description: Option<&str>,
        image_url: Option<&str>,
        price: Option<&str>,
        link_url: Option<&str>,
    ) -> AppResult<ProductCard> {
        let card = ProductCard {
            id: Uuid::new_v4(),
            owner_user_id,
            title: title.to_owned(),
            description: description.map(ToOwned::to_owned),
            image_url: image_url.map(ToOwned::to_owned),
            price: price.map(ToOwned::to_owned),
            link_url: link_url.map(ToOwned::to_owned),
            sort_index: self
                .next_sort_index(ContentCollection::Products, owner_user_id)
                .await?,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO product_cards (
                id, owner_user_id, title, description, image_url, price, link_url,
                sort_index, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(card.id.to_string())
        .bind(card.owner_user_id.to_string())
        .bind(&card.title)
        .bind(&card.description)
        .bind(&card.image_url)
        .bind(&card.price)
        .bind(&card.link_url)
        .bind(card.sort_index)
        .bind(card.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create product card: {e}")))?;

        Ok(card)
    }

    /// Update a product card the owner holds; `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_product_card(
        &self,
        owner_user_id: Uuid,
        card_id: Uuid,
        title: &str,
        description: Option<&str>,
        image_url: Option<&str>,
        price: Option<&str>,
        link_url: Option<&str>,
    ) -> AppResult<Option<ProductCard>> {
        let result = sqlx::query(
            r"
            UPDATE product_cards
            SET title = $1, description = $2, image_url = $3, price = $4, link_url = $5
            WHERE id = $6 AND owner_user_id = $7
            ",
        )
        .bind(title)
        .bind(description)
        .bind(image_url)
        .bind(price)
        .bind(link_url)
        .bind(card_id.to_string())
        .bind(owner_user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update product card: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query("SELECT * FROM product_cards WHERE id = $1")
            .bind(card_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reload product card: {e}")))?;
        Ok(Some(Self::row_to_product(&row)?))
    }

    /// List the owner's product cards in display order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_product_cards(&self, owner_user_id: Uuid) -> AppResult<Vec<ProductCard>> {
        let rows = sqlx::query(
            "SELECT * FROM product_cards WHERE owner_user_id = $1 ORDER BY sort_index ASC, created_at ASC",
        )
        .bind(owner_user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list product cards: {e}")))?;

        rows.iter().map(Self::row_to_product).collect()
    }

    // ================================================================
    // Instagram posts
    // ================================================================

    /// Create an Instagram post appended to the end of the owner's feed
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_instagram_post(
        &self,
        owner_user_id: Uuid,
        image_url: &str,
        caption: Option<&str>,
        post_url: Option<&str>,
    ) -> AppResult<InstagramPost> {
        let post = InstagramPost {
            id: Uuid::new_v4(),
            owner_user_id,
            image_url: image_url.to_owned(),
            caption: caption.map(ToOwned::to_owned),
            post_url: post_url.map(ToOwned::to_owned),
            sort_index: self
                .next_sort_index(ContentCollection::Instagram, owner_user_id)
                .await?,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO instagram_posts (
                id, owner_user_id, image_url, caption, post_url, sort_index, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(post.id.to_string())
        .bind(post.owner_user_id.to_string())
        .bind(&post.image_url)
        .bind(&post.caption)
        .bind(&post.post_url)
        .bind(post.sort_index)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create Instagram post: {e}")))?;

        Ok(post)
    }

    /// Update an Instagram post the owner holds; `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_instagram_post(
        &self,
        owner_user_id: Uuid,
        post_id: Uuid,
        image_url: &str,
        caption: Option<&str>,
        post_url: Option<&str>,
    ) -> AppResult<Option<InstagramPost>> {
        let result = sqlx::query(
            r"
            UPDATE instagram_posts
            SET image_url = $1, caption = $2, post_url = $3
            WHERE id = $4 AND owner_user_id = $5
            ",
        )
        .bind(image_url)
        .bind(caption)
        .bind(post_url)
        .bind(post_id.to_string())
        .bind(owner_user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update Instagram post: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query("SELECT * FROM instagram_posts WHERE id = $1")
            .bind(post_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reload Instagram post: {e}")))?;
        Ok(Some(Self::row_to_instagram(&row)?))
    }

    /// List the owner's Instagram posts in display order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_instagram_posts(&self, owner_user_id: Uuid) -> AppResult<Vec<InstagramPost>> {
        let rows = sqlx::query(
            "SELECT * FROM instagram_posts WHERE owner_user_id = $1 ORDER BY sort_index ASC, created_at ASC",
        )
        .bind(owner_user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list Instagram posts: {e}")))?;

        rows.iter().map(Self::row_to_instagram).collect()
    }

    // ================================================================
    // Custom links
    // ================================================================

    /// Create a link button appended to the end of the owner's list
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_custom_link(
        &self,
        owner_user_id: Uuid,
        label: &str,
        url: &str,
    ) -> AppResult<CustomLink> {
        let link = CustomLink {
            id: Uuid::new_v4(),
            owner_user_id,
            label: label.to_owned(),
            url: url.to_owned(),
            sort_index: self
                .next_sort_index(ContentCollection::Links, owner_user_id)
                .await?,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO custom_links (id, owner_user_id, label, url, sort_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(link.id.to_string())
        .bind(link.owner_user_id.to_string())
        .bind(&link.label)
        .bind(&link.url)
        .bind(link.sort_index)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create link: {e}")))?;

        Ok(link)
    }

    /// Update a link button the owner holds; `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_custom_link(
        &self,
        owner_user_id: Uuid,
        link_id: Uuid,
        label: &str,
        url: &str,
    ) -> AppResult<Option<CustomLink>> {
        let result = sqlx::query(
            "UPDATE custom_links SET label = $1, url = $2 WHERE id = $3 AND owner_user_id = $4",
        )
        .bind(label)
        .bind(url)
        .bind(link_id.to_string())
        .bind(owner_user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update link: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query("SELECT * FROM custom_links WHERE id = $1")
            .bind(link_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reload link: {e}")))?;
        Ok(Some(Self::row_to_link(&row)?))
    }

    /// List the owner's link buttons in display order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_custom_links(&self, owner_user_id: Uuid) -> AppResult<Vec<CustomLink>> {
        let rows = sqlx::query(
            "SELECT * FROM custom_links WHERE owner_user_id = $1 ORDER BY sort_index ASC, created_at ASC",
        )
        .bind(owner_user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list links: {e}")))?;

        rows.iter().map(Self::row_to_link).collect()
    }

    // ================================================================
    // Shared operations
    // ================================================================

    /// Delete an item from any collection; `false` when it does not exist
    /// or belongs to another owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete_content_item(
        &self,
        owner_user_id: Uuid,
        collection: ContentCollection,
        item_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND owner_user_id = $2",
            collection.table_name()
        ))
        .bind(item_id.to_string())
        .bind(owner_user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!(
                "Failed to delete {} item: {e}",
                collection.as_str()
            ))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply a new display order; positions follow the given ID sequence
    ///
    /// IDs not owned by the caller are silently skipped, items missing from
    /// the list keep their old index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn reorder_content(
        &self,
        owner_user_id: Uuid,
        collection: ContentCollection,
        ordered_ids: &[Uuid],
    ) -> AppResult<()> {
        let sql = format!(
            "UPDATE {} SET sort_index = $1 WHERE id = $2 AND owner_user_id = $3",
            collection.table_name()
        );
        for (position, item_id) in ordered_ids.iter().enumerate() {
            sqlx::query(&sql)
                .bind(i64::try_from(position).unwrap_or(i64::MAX))
                .bind(item_id.to_string())
                .bind(owner_user_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::database(format!(
                        "Failed to reorder {} items: {e}",
                        collection.as_str()
                    ))
                })?;
        }
        Ok(())
    }

    /// Next free position at the end of a collection
    async fn next_sort_index(
        &self,
        collection: ContentCollection,
        owner_user_id: Uuid,
    ) -> AppResult<i64> {
        let row = sqlx::query(&format!(
            "SELECT COALESCE(MAX(sort_index) + 1, 0) AS next FROM {} WHERE owner_user_id = $1",
            collection.table_name()
        ))
        .bind(owner_user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute sort index: {e}")))?;

        Ok(row.get::<i64, _>("next"))
    }

    fn row_to_faq(row: &sqlx::sqlite::SqliteRow) -> AppResult<FaqItem> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_user_id");
        Ok(FaqItem {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt FAQ item id: {e}")))?,
            owner_user_id: Uuid::parse_str(&owner)
                .map_err(|e| AppError::database(format!("Corrupt FAQ owner id: {e}")))?,
            question: row.get("question"),
            answer: row.get("answer"),
            sort_index: row.get("sort_index"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> AppResult<ProductCard> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_user_id");
        Ok(ProductCard {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt product id: {e}")))?,
            owner_user_id: Uuid::parse_str(&owner)
                .map_err(|e| AppError::database(format!("Corrupt product owner id: {e}")))?,
            title: row.get("title"),
            description: row.get("description"),
            image_url: row.get("image_url"),
            price: row.get("price"),
            link_url: row.get("link_url"),
            sort_index: row.get("sort_index"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    fn row_to_instagram(row: &sqlx::sqlite::SqliteRow) -> AppResult<InstagramPost> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_user_id");
        Ok(InstagramPost {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt post id: {e}")))?,
            owner_user_id: Uuid::parse_str(&owner)
                .map_err(|e| AppError::database(format!("Corrupt post owner id: {e}")))?,
            image_url: row.get("image_url"),
            caption: row.get("caption"),
            post_url: row.get("post_url"),
            sort_index: row.get("sort_index"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    fn row_to_link(row: &sqlx::sqlite::SqliteRow) -> AppResult<CustomLink> {
        let id: String = row.get("id");
        let owner: String = row.get("owner_user_id");
        Ok(CustomLink {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::database(format!("Corrupt link id: {e}")))?,
            owner_user_id: Uuid::parse_str(&owner)
                .map_err(|e| AppError::database(format!("Corrupt link owner id: {e}")))?,
            label: row.get("label"),
            url: row.get("url"),
            sort_index: row.get("sort_index"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_db;
    use super::ContentCollection;

    #[tokio::test]
    async fn test_sort_index_appends_and_reorder_applies() {
        let db = create_test_db().await.unwrap();
        let owner = db.get_or_create_user("owner@example.com").await.unwrap();

        let a = db.create_faq_item(owner.id, "Shipping?", "3 days").await.unwrap();
        let b = db.create_faq_item(owner.id, "Returns?", "30 days").await.unwrap();
        let c = db.create_faq_item(owner.id, "Sizing?", "Runs small").await.unwrap();
        assert_eq!((a.sort_index, b.sort_index, c.sort_index), (0, 1, 2));

        db.reorder_content(owner.id, ContentCollection::Faq, &[c.id, a.id, b.id])
            .await
            .unwrap();

        let listed = db.list_faq_items(owner.id).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }

    #[tokio::test]
    async fn test_delete_respects_ownership() {
        let db = create_test_db().await.unwrap();
        let owner = db.get_or_create_user("owner@example.com").await.unwrap();
        let other = db.get_or_create_user("other@example.com").await.unwrap();

        let link = db
            .create_custom_link(owner.id, "Blog", "https://example.com/blog")
            .await
            .unwrap();

        let foreign = db
            .delete_content_item(other.id, ContentCollection::Links, link.id)
            .await
            .unwrap();
        assert!(!foreign, "another owner's delete must be a no-op");

        let own = db
            .delete_content_item(owner.id, ContentCollection::Links, link.id)
            .await
            .unwrap();
        assert!(own);
        assert!(db.list_custom_links(owner.id).await.unwrap().is_empty());
    }
}
