//! Item repository
//!
//! Database operations for items, including the image-filename listing used
//! by the two-phase category delete.

use crate::models::Item;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Item repository trait
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Create a new item
    async fn create(&self, item: &Item) -> Result<Item>;

    /// Get item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Item>>;

    /// Get item by name within a category
    async fn get_by_name(&self, category_id: i64, name: &str) -> Result<Option<Item>>;

    /// List items in a category, newest first
    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Item>>;

    /// List the most recently published items across all categories
    async fn list_recent(&self, limit: i64) -> Result<Vec<Item>>;

    /// List stored image filenames for all items in a category
    async fn list_images_by_category(&self, category_id: i64) -> Result<Vec<String>>;

    /// Update an item
    async fn update(&self, item: &Item) -> Result<Item>;

    /// Delete an item
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based item repository implementation
pub struct SqlxItemRepository {
    pool: SqlitePool,
}

impl SqlxItemRepository {
    /// Create a new SQLx item repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ItemRepository> {
        Arc::new(Self::new(pool))
    }
}

const ITEM_COLUMNS: &str =
    "id, name, body, pub_date, author_id, category_id, image, created_at, updated_at";

#[async_trait]
impl ItemRepository for SqlxItemRepository {
    async fn create(&self, item: &Item) -> Result<Item> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO items (name, body, pub_date, author_id, category_id, image, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.name)
        .bind(&item.body)
        .bind(item.pub_date)
        .bind(item.author_id)
        .bind(item.category_id)
        .bind(&item.image)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create item")?;

        Ok(Item {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..item.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get item by ID")?;

        row.map(|row| row_to_item(&row)).transpose()
    }

    async fn get_by_name(&self, category_id: i64, name: &str) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM items WHERE category_id = ? AND name = ?",
            ITEM_COLUMNS
        ))
        .bind(category_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get item by name")?;

        row.map(|row| row_to_item(&row)).transpose()
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM items WHERE category_id = ? ORDER BY pub_date DESC",
            ITEM_COLUMNS
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list items by category")?;

        rows.iter().map(row_to_item).collect()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM items ORDER BY pub_date DESC LIMIT ?",
            ITEM_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent items")?;

        rows.iter().map(row_to_item).collect()
    }

    async fn list_images_by_category(&self, category_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT image FROM items WHERE category_id = ? AND image IS NOT NULL",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list item images")?;

        Ok(rows.iter().map(|row| row.get("image")).collect())
    }

    async fn update(&self, item: &Item) -> Result<Item> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE items
            SET name = ?, body = ?, pub_date = ?, category_id = ?, image = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.name)
        .bind(&item.body)
        .bind(item.pub_date)
        .bind(item.category_id)
        .bind(&item.image)
        .bind(now)
        .bind(item.id)
        .execute(&self.pool)
        .await
        .context("Failed to update item")?;

        self.get_by_id(item.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Item not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete item")?;

        Ok(())
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item> {
    Ok(Item {
        id: row.get("id"),
        name: row.get("name"),
        body: row.get("body"),
        pub_date: row.get("pub_date"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        image: row.get("image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
