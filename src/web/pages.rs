//! HTML page handlers
//!
//! The catalog views and the category/item CRUD flows. Every mutation
//! follows the same shape: authorize, validate, persist, flash, redirect.
//! Authorization failures are never error statuses; they flash a message
//! and redirect back to the catalog.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tera::Context;

use crate::models::{CreateItemInput, UpdateItemInput};
use crate::services::CategoryServiceError;
use crate::web::error::PageError;
use crate::web::forms::{CategoryForm, ItemForm};
use crate::web::session::{require_login, SessionContext};
use crate::web::state::AppState;
use crate::web::templates::render_page;

/// URL of a category page
fn category_url(name: &str) -> String {
    format!("/{}", urlencoding::encode(name))
}

/// Flash a message and redirect; the shared unauthorized/success exit
async fn flash_redirect(
    state: &AppState,
    ctx: &mut SessionContext,
    message: &str,
    to: &str,
) -> Result<Response, PageError> {
    state
        .sessions
        .set_flash(&mut ctx.session, message)
        .await
        .map_err(PageError::Internal)?;
    Ok(Redirect::to(to).into_response())
}

/// GET / - all categories and the latest items
pub async fn show_categories(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let categories = state.categories.list_all().await?;
    let items = state.items.list_recent().await?;

    let mut context = Context::new();
    context.insert("categories", &categories);
    context.insert("items", &items);

    Ok(render_page(&state, &mut ctx, "categories.html", context)
        .await?
        .into_response())
}

/// GET /{category_name} - one category and its items
pub async fn show_category(
    State(state): State<AppState>,
    Path(category_name): Path<String>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let category = state
        .categories
        .get_by_name(&category_name)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("category {}", category_name)))?;

    let items = state.items.list_by_category(category.id).await?;

    let mut context = Context::new();
    context.insert("category", &category);
    context.insert("items", &items);

    Ok(render_page(&state, &mut ctx, "category.html", context)
        .await?
        .into_response())
}

/// GET /{category_name}/{item_name} - item details
pub async fn show_item(
    State(state): State<AppState>,
    Path((category_name, item_name)): Path<(String, String)>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let category = state
        .categories
        .get_by_name(&category_name)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("category {}", category_name)))?;

    let item = state
        .items
        .get_by_name(category.id, &item_name)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("item {}", item_name)))?;

    let mut context = Context::new();
    context.insert("category", &category);
    context.insert("item", &item);

    Ok(render_page(&state, &mut ctx, "item.html", context)
        .await?
        .into_response())
}

// ----------------------------------------------------------------------------
// Categories
// ----------------------------------------------------------------------------

fn category_form_context(name: &str, errors: &crate::web::forms::FieldErrors, action: &str, heading: &str) -> Context {
    let mut context = Context::new();
    context.insert("name", name);
    context.insert("errors", errors);
    context.insert("action", action);
    context.insert("heading", heading);
    context
}

/// GET /category/new
pub async fn new_category_form(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    require_login(&state, &mut ctx).await?;

    let context = category_form_context("", &Default::default(), "/category/new", "New category");
    Ok(render_page(&state, &mut ctx, "category_form.html", context)
        .await?
        .into_response())
}

/// POST /category/new
pub async fn create_category(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Form(form): Form<CategoryForm>,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let mut errors = form.validate();
    if errors.is_empty() {
        match state.categories.create(&form.name, user.id).await {
            Ok(_) => {
                return flash_redirect(
                    &state,
                    &mut ctx,
                    "New category was successfully posted",
                    "/",
                )
                .await;
            }
            Err(CategoryServiceError::DuplicateName(name)) => {
                errors.insert("name", format!("Category '{}' already exists.", name));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let context =
        category_form_context(&form.name, &errors, "/category/new", "New category");
    Ok(render_page(&state, &mut ctx, "category_form.html", context)
        .await?
        .into_response())
}

/// GET /category/edit/{id}
pub async fn edit_category_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let category = state.categories.get_by_id(id).await?;
    if !category.is_author(&user) {
        return flash_redirect(&state, &mut ctx, "Only the author can edit this category", "/")
            .await;
    }

    let action = format!("/category/edit/{}", id);
    let context =
        category_form_context(&category.name, &Default::default(), &action, "Edit category");
    Ok(render_page(&state, &mut ctx, "category_form.html", context)
        .await?
        .into_response())
}

/// POST /category/edit/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut ctx: SessionContext,
    Form(form): Form<CategoryForm>,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let category = state.categories.get_by_id(id).await?;
    if !category.is_author(&user) {
        return flash_redirect(&state, &mut ctx, "Only the author can edit this category", "/")
            .await;
    }

    let mut errors = form.validate();
    if errors.is_empty() {
        match state.categories.rename(id, &form.name).await {
            Ok(_) => {
                return flash_redirect(&state, &mut ctx, "Category updated successfully", "/")
                    .await;
            }
            Err(CategoryServiceError::DuplicateName(name)) => {
                errors.insert("name", format!("Category '{}' already exists.", name));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let action = format!("/category/edit/{}", id);
    let context = category_form_context(&form.name, &errors, &action, "Edit category");
    Ok(render_page(&state, &mut ctx, "category_form.html", context)
        .await?
        .into_response())
}

/// GET /category/delete/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let category = state.categories.get_by_id(id).await?;
    if !category.is_author(&user) {
        return flash_redirect(
            &state,
            &mut ctx,
            "Only the author can delete this category",
            "/",
        )
        .await;
    }

    let deleted = state.categories.delete(id).await?;

    let message = format!("{} category deleted successfully", deleted.name);
    flash_redirect(&state, &mut ctx, &message, "/").await
}

// ----------------------------------------------------------------------------
// Items
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NewItemQuery {
    pub c_id: Option<i64>,
}

#[allow(clippy::too_many_arguments)]
async fn render_item_form(
    state: &AppState,
    ctx: &mut SessionContext,
    form: &ItemForm,
    current_image: Option<&str>,
    errors: &crate::web::forms::FieldErrors,
    action: &str,
    heading: &str,
) -> Result<Response, PageError> {
    let categories = state.categories.list_all().await?;

    let mut context = Context::new();
    context.insert("categories", &categories);
    context.insert("name", &form.name);
    context.insert("body", &form.body);
    context.insert("selected_category_id", &form.category_id);
    context.insert("current_image", &current_image);
    context.insert("errors", errors);
    context.insert("action", action);
    context.insert("heading", heading);

    Ok(render_page(state, ctx, "item_form.html", context)
        .await?
        .into_response())
}

/// GET /item/new - ?c_id= pre-selects the category
pub async fn new_item_form(
    State(state): State<AppState>,
    Query(query): Query<NewItemQuery>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    require_login(&state, &mut ctx).await?;

    let form = ItemForm {
        category_id: query.c_id,
        ..Default::default()
    };

    render_item_form(
        &state,
        &mut ctx,
        &form,
        None,
        &Default::default(),
        "/item/new",
        "New item",
    )
    .await
}

/// POST /item/new
pub async fn create_item(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let form = ItemForm::from_multipart(multipart).await?;
    let mut errors = form.validate(&state.upload_config);

    if let (true, Some(category_id)) = (errors.is_empty(), form.category_id) {
        let image = match form.image {
            Some(ref upload) => Some(
                state
                    .images
                    .save(&upload.data, &upload.content_type)
                    .await
                    .map_err(PageError::Internal)?,
            ),
            None => None,
        };

        match state
            .items
            .create(
                CreateItemInput {
                    name: form.name.clone(),
                    body: form.body.clone(),
                    category_id,
                    pub_date: None,
                    image: image.clone(),
                },
                user.id,
            )
            .await
        {
            Ok(item) => {
                let category = state.categories.get_by_id(item.category_id).await?;
                return flash_redirect(
                    &state,
                    &mut ctx,
                    "Item created successfully",
                    &category_url(&category.name),
                )
                .await;
            }
            Err(e) => {
                // The row never landed; don't leave the file behind
                if let Some(ref filename) = image {
                    let _ = state.images.remove(filename).await;
                }
                match e {
                    crate::services::ItemServiceError::DuplicateName(name) => {
                        errors.insert(
                            "name",
                            format!("Item '{}' already exists in this category.", name),
                        );
                    }
                    crate::services::ItemServiceError::CategoryNotFound(_) => {
                        errors.insert("category_id", "Unknown category.".to_string());
                    }
                    other => return Err(other.into()),
                }
            }
        }
    }

    render_item_form(
        &state,
        &mut ctx,
        &form,
        None,
        &errors,
        "/item/new",
        "New item",
    )
    .await
}

/// GET /item/edit/{id}
pub async fn edit_item_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let item = state.items.get_by_id(id).await?;
    let category = state.categories.get_by_id(item.category_id).await?;
    if !item.is_author(&user) {
        return flash_redirect(
            &state,
            &mut ctx,
            "Only the author can edit this item",
            &category_url(&category.name),
        )
        .await;
    }

    let form = ItemForm {
        name: item.name.clone(),
        body: item.body.clone(),
        category_id: Some(item.category_id),
        image: None,
    };
    let action = format!("/item/edit/{}", id);

    render_item_form(
        &state,
        &mut ctx,
        &form,
        item.image.as_deref(),
        &Default::default(),
        &action,
        "Edit item",
    )
    .await
}

/// POST /item/edit/{id}
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut ctx: SessionContext,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let item = state.items.get_by_id(id).await?;
    let category = state.categories.get_by_id(item.category_id).await?;
    if !item.is_author(&user) {
        return flash_redirect(
            &state,
            &mut ctx,
            "Only the author can edit this item",
            &category_url(&category.name),
        )
        .await;
    }

    let form = ItemForm::from_multipart(multipart).await?;
    let mut errors = form.validate(&state.upload_config);

    if errors.is_empty() {
        let image = match form.image {
            Some(ref upload) => Some(
                state
                    .images
                    .save(&upload.data, &upload.content_type)
                    .await
                    .map_err(PageError::Internal)?,
            ),
            None => None,
        };

        match state
            .items
            .update(
                id,
                UpdateItemInput {
                    name: Some(form.name.clone()),
                    body: Some(form.body.clone()),
                    category_id: form.category_id,
                    image: image.clone(),
                },
            )
            .await
        {
            Ok(_) => {
                return flash_redirect(&state, &mut ctx, "Item updated successfully", "/").await;
            }
            Err(e) => {
                if let Some(ref filename) = image {
                    let _ = state.images.remove(filename).await;
                }
                match e {
                    crate::services::ItemServiceError::CategoryNotFound(_) => {
                        errors.insert("category_id", "Unknown category.".to_string());
                    }
                    other => return Err(other.into()),
                }
            }
        }
    }

    let action = format!("/item/edit/{}", id);
    render_item_form(
        &state,
        &mut ctx,
        &form,
        item.image.as_deref(),
        &errors,
        &action,
        "Edit item",
    )
    .await
}

/// GET /item/delete/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let user = require_login(&state, &mut ctx).await?;

    let item = state.items.get_by_id(id).await?;
    let category = state.categories.get_by_id(item.category_id).await?;

    if !item.is_author(&user) {
        return flash_redirect(
            &state,
            &mut ctx,
            "Only the author can delete this item",
            &category_url(&category.name),
        )
        .await;
    }

    let deleted = state.items.delete(id).await?;

    let message = format!("{} deleted successfully", deleted.name);
    flash_redirect(&state, &mut ctx, &message, &category_url(&category.name)).await
}
