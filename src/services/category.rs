//! Category service
//!
//! Business logic for categories:
//! - Create / rename with name uniqueness
//! - Two-phase cascade delete (rows first, stored image files after)
//! - Cached name lookups and listings for the public pages

use crate::cache::MemoryCache;
use crate::db::repositories::{CategoryRepository, ItemRepository};
use crate::models::Category;
use crate::services::images::ImageStore;
use anyhow::Context;
use std::sync::Arc;

const CACHE_KEY_CATEGORY_BY_NAME: &str = "category:name:";
const CACHE_KEY_CATEGORY_LIST: &str = "category:list";

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category name already exists
    #[error("Category name already exists: {0}")]
    DuplicateName(String),

    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    item_repo: Arc<dyn ItemRepository>,
    images: ImageStore,
    cache: Arc<MemoryCache>,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(
        repo: Arc<dyn CategoryRepository>,
        item_repo: Arc<dyn ItemRepository>,
        images: ImageStore,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            repo,
            item_repo,
            images,
            cache,
        }
    }

    /// Create a new category owned by `author_id`
    pub async fn create(
        &self,
        name: &str,
        author_id: i64,
    ) -> Result<Category, CategoryServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_name(name)
            .await
            .context("Failed to check category name")?
        {
            return Err(CategoryServiceError::DuplicateName(name.to_string()));
        }

        let created = self
            .repo
            .create(&Category::new(name.to_string(), author_id))
            .await
            .context("Failed to create category")?;

        self.invalidate_cache().await;

        Ok(created)
    }

    /// Rename a category
    pub async fn rename(&self, id: i64, name: &str) -> Result<Category, CategoryServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let existing = self.get_by_id(id).await?;

        if name != existing.name
            && self
                .repo
                .exists_by_name(name)
                .await
                .context("Failed to check category name")?
        {
            return Err(CategoryServiceError::DuplicateName(name.to_string()));
        }

        self.repo
            .update_name(id, name)
            .await
            .context("Failed to rename category")?;

        self.invalidate_cache().await;

        self.get_by_id(id).await
    }

    /// Delete a category and everything under it.
    ///
    /// Two phases: the stored image filenames of the category's items are
    /// collected first, then the row is deleted (items cascade with it), and
    /// only after that commit are the files removed. Files that fail to
    /// delete are logged and left behind.
    pub async fn delete(&self, id: i64) -> Result<Category, CategoryServiceError> {
        let category = self.get_by_id(id).await?;

        let images = self
            .item_repo
            .list_images_by_category(id)
            .await
            .context("Failed to collect item images")?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete category")?;

        self.images.remove_all(&images).await;

        self.invalidate_cache().await;

        Ok(category)
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category by ID")?
            .ok_or_else(|| CategoryServiceError::NotFound(format!("id {}", id)))
    }

    /// Get category by name, serving repeated page hits from cache
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Category>, CategoryServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_CATEGORY_BY_NAME, name);
        if let Some(category) = self.cache.get::<Category>(&cache_key).await.ok().flatten() {
            return Ok(Some(category));
        }

        let category = self
            .repo
            .get_by_name(name)
            .await
            .context("Failed to get category by name")?;

        if let Some(ref cat) = category {
            let _ = self.cache.set(&cache_key, cat).await;
        }

        Ok(category)
    }

    /// List all categories ordered by name
    pub async fn list_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        if let Some(categories) = self
            .cache
            .get::<Vec<Category>>(CACHE_KEY_CATEGORY_LIST)
            .await
            .ok()
            .flatten()
        {
            return Ok(categories);
        }

        let categories = self
            .repo
            .list_all()
            .await
            .context("Failed to list categories")?;

        let _ = self.cache.set(CACHE_KEY_CATEGORY_LIST, &categories).await;

        Ok(categories)
    }

    async fn invalidate_cache(&self) {
        self.cache.remove(CACHE_KEY_CATEGORY_LIST).await;
        self.cache.remove_prefix(CACHE_KEY_CATEGORY_BY_NAME).await;
        // Item payloads embed category data
        self.cache.remove_prefix("catalog:").await;
    }
}
