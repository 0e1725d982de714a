//! JSON read endpoints
//!
//! Read-only mirrors of the HTML views:
//! - GET /catalog.json - the whole entity graph
//! - GET /{category_name}/items.json - one category's items
//! - GET /{category_name}/{item_name}/item.json - one item
//!
//! The catalog payload is served from the shared cache; catalog mutations
//! invalidate it.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Item;
use crate::web::error::ApiError;
use crate::web::state::AppState;

const CACHE_KEY_CATALOG: &str = "catalog:json";

/// Item as serialized in the JSON endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemJson {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub author_id: i64,
    pub pub_date: DateTime<Utc>,
}

impl From<Item> for ItemJson {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.body,
            category_id: item.category_id,
            author_id: item.author_id,
            pub_date: item.pub_date,
        }
    }
}

/// Category with its items as serialized in /catalog.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryJson {
    pub id: i64,
    /// The category name; historical field name kept for clients
    pub category: String,
    pub author_id: i64,
    pub items: Vec<ItemJson>,
}

/// Response body for /catalog.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub categories: Vec<CategoryJson>,
}

/// Response body for /{category_name}/items.json
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<ItemJson>,
}

/// Response body for /{category_name}/{item_name}/item.json
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item: ItemJson,
}

/// GET /catalog.json
pub async fn catalog(State(state): State<AppState>) -> Result<Json<CatalogResponse>, ApiError> {
    if let Some(cached) = state
        .cache
        .get::<CatalogResponse>(CACHE_KEY_CATALOG)
        .await
        .ok()
        .flatten()
    {
        return Ok(Json(cached));
    }

    let categories = state
        .categories
        .list_all()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let mut payload = Vec::with_capacity(categories.len());
    for category in categories {
        let items = state
            .items
            .list_by_category(category.id)
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;

        payload.push(CategoryJson {
            id: category.id,
            category: category.name,
            author_id: category.author_id,
            items: items.into_iter().map(Into::into).collect(),
        });
    }

    let response = CatalogResponse {
        categories: payload,
    };

    let _ = state.cache.set(CACHE_KEY_CATALOG, &response).await;

    Ok(Json(response))
}

/// GET /{category_name}/items.json
pub async fn category_items(
    State(state): State<AppState>,
    Path(category_name): Path<String>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let category = state
        .categories
        .get_by_name(&category_name)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", category_name)))?;

    let items = state
        .items
        .list_by_category(category.id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ItemsResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

/// GET /{category_name}/{item_name}/item.json
pub async fn item(
    State(state): State<AppState>,
    Path((category_name, item_name)): Path<(String, String)>,
) -> Result<Json<ItemResponse>, ApiError> {
    let category = state
        .categories
        .get_by_name(&category_name)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", category_name)))?;

    let item = state
        .items
        .get_by_name(category.id, &item_name)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("Item not found: {}", item_name)))?;

    Ok(Json(ItemResponse { item: item.into() }))
}
