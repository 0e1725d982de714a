//! Item service
//!
//! Business logic for items: creation with a defaulted publication date,
//! partial updates (including image replacement), and the two-phase delete
//! that removes the stored image only after the row is gone.

use crate::cache::MemoryCache;
use crate::db::repositories::{CategoryRepository, ItemRepository};
use crate::models::{CreateItemInput, Item, UpdateItemInput};
use crate::services::images::ImageStore;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// How many items the front page shows
pub const RECENT_ITEMS_LIMIT: i64 = 10;

/// Error types for item service operations
#[derive(Debug, thiserror::Error)]
pub enum ItemServiceError {
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Target category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    /// An item with this name already exists in the category
    #[error("Item name already exists in this category: {0}")]
    DuplicateName(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Item service
pub struct ItemService {
    repo: Arc<dyn ItemRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    images: ImageStore,
    cache: Arc<MemoryCache>,
}

impl ItemService {
    /// Create a new item service
    pub fn new(
        repo: Arc<dyn ItemRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        images: ImageStore,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            repo,
            category_repo,
            images,
            cache,
        }
    }

    /// Create a new item owned by `author_id`.
    ///
    /// `pub_date` defaults to the creation time when omitted.
    pub async fn create(
        &self,
        input: CreateItemInput,
        author_id: i64,
    ) -> Result<Item, ItemServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ItemServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        self.require_category(input.category_id).await?;

        if self
            .repo
            .get_by_name(input.category_id, &name)
            .await
            .context("Failed to check item name")?
            .is_some()
        {
            return Err(ItemServiceError::DuplicateName(name));
        }

        let now = Utc::now();
        let item = Item {
            id: 0,
            name,
            body: input.body,
            pub_date: input.pub_date.unwrap_or(now),
            author_id,
            category_id: input.category_id,
            image: input.image,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&item)
            .await
            .context("Failed to create item")?;

        self.invalidate_cache().await;

        Ok(created)
    }

    /// Partially update an item.
    ///
    /// When a new image filename is supplied the previous file is removed
    /// after the row update commits.
    pub async fn update(&self, id: i64, input: UpdateItemInput) -> Result<Item, ItemServiceError> {
        let mut item = self.get_by_id(id).await?;
        let previous_image = item.image.clone();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ItemServiceError::ValidationError(
                    "Name cannot be empty".to_string(),
                ));
            }
            item.name = name;
        }
        if let Some(body) = input.body {
            item.body = body;
        }
        if let Some(category_id) = input.category_id {
            self.require_category(category_id).await?;
            item.category_id = category_id;
        }

        let replacing_image = input.image.is_some();
        if let Some(image) = input.image {
            item.image = Some(image);
        }

        let updated = self
            .repo
            .update(&item)
            .await
            .context("Failed to update item")?;

        if replacing_image {
            if let Some(old) = previous_image {
                if Some(&old) != updated.image.as_ref() {
                    if let Err(e) = self.images.remove(&old).await {
                        tracing::warn!("Failed to remove replaced image {}: {}", old, e);
                    }
                }
            }
        }

        self.invalidate_cache().await;

        Ok(updated)
    }

    /// Delete an item, then its stored image
    pub async fn delete(&self, id: i64) -> Result<Item, ItemServiceError> {
        let item = self.get_by_id(id).await?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete item")?;

        if let Some(ref image) = item.image {
            if let Err(e) = self.images.remove(image).await {
                tracing::warn!("Failed to remove image {}: {}", image, e);
            }
        }

        self.invalidate_cache().await;

        Ok(item)
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Item, ItemServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get item by ID")?
            .ok_or_else(|| ItemServiceError::NotFound(format!("id {}", id)))
    }

    /// Get item by name within a category
    pub async fn get_by_name(
        &self,
        category_id: i64,
        name: &str,
    ) -> Result<Option<Item>, ItemServiceError> {
        let item = self
            .repo
            .get_by_name(category_id, name)
            .await
            .context("Failed to get item by name")?;

        Ok(item)
    }

    /// List items in a category, newest first
    pub async fn list_by_category(&self, category_id: i64) -> Result<Vec<Item>, ItemServiceError> {
        let items = self
            .repo
            .list_by_category(category_id)
            .await
            .context("Failed to list items")?;

        Ok(items)
    }

    /// The most recently published items, for the front page
    pub async fn list_recent(&self) -> Result<Vec<Item>, ItemServiceError> {
        let items = self
            .repo
            .list_recent(RECENT_ITEMS_LIMIT)
            .await
            .context("Failed to list recent items")?;

        Ok(items)
    }

    async fn require_category(&self, category_id: i64) -> Result<(), ItemServiceError> {
        if self
            .category_repo
            .get_by_id(category_id)
            .await
            .context("Failed to get category")?
            .is_none()
        {
            return Err(ItemServiceError::CategoryNotFound(category_id));
        }
        Ok(())
    }

    async fn invalidate_cache(&self) {
        self.cache.remove_prefix("catalog:").await;
    }
}
