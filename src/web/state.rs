//! Application state
//!
//! The dependency-injected handle bundle passed to every handler: the pool,
//! the services, the template engine, and the upload/OAuth configuration.
//! Built once at startup (or per test) from a `Config` and a pool.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    SqlxCategoryRepository, SqlxItemRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::services::{
    CategoryService, FacebookClient, ImageStore, ItemService, SessionService, UserService,
};
use crate::web::templates::TemplateEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub users: Arc<UserService>,
    pub sessions: Arc<SessionService>,
    pub categories: Arc<CategoryService>,
    pub items: Arc<ItemService>,
    pub facebook: Arc<FacebookClient>,
    pub templates: Arc<TemplateEngine>,
    pub cache: Arc<MemoryCache>,
    pub upload_config: Arc<UploadConfig>,
    pub images: ImageStore,
}

impl AppState {
    /// Wire repositories and services together over the given pool.
    pub fn build(config: &Config, pool: SqlitePool, templates: TemplateEngine) -> Result<Self> {
        let cache = Arc::new(MemoryCache::new());
        let images = ImageStore::new(config.upload.path.clone());

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());
        let item_repo = SqlxItemRepository::boxed(pool.clone());

        let users = Arc::new(UserService::new(user_repo));
        let sessions = Arc::new(SessionService::new(session_repo));
        let categories = Arc::new(CategoryService::new(
            category_repo.clone(),
            item_repo.clone(),
            images.clone(),
            cache.clone(),
        ));
        let items = Arc::new(ItemService::new(
            item_repo,
            category_repo,
            images.clone(),
            cache.clone(),
        ));

        let facebook = Arc::new(FacebookClient::new(config.facebook.clone())?);

        Ok(Self {
            pool,
            users,
            sessions,
            categories,
            items,
            facebook,
            templates: Arc::new(templates),
            cache,
            upload_config: Arc::new(config.upload.clone()),
            images,
        })
    }

    /// The OAuth application id, embedded into the login page
    pub fn facebook_app_id(&self) -> String {
        self.facebook.app_id().to_string()
    }
}
