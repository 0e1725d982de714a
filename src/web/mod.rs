//! Web layer - HTTP handlers and routing
//!
//! HTML page routes, the JSON read endpoints, the auth flows, and the
//! session middleware that backs them all. Uploaded item images are served
//! statically under /uploads.

pub mod auth;
pub mod error;
pub mod forms;
pub mod json;
pub mod pages;
pub mod session;
pub mod state;
pub mod templates;

#[cfg(test)]
mod tests;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use error::{ApiError, PageError};
pub use state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::show_categories))
        .route("/catalog.json", get(json::catalog))
        // Local auth
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        // OAuth post-back
        .route("/fbconnect", post(auth::fbconnect))
        // Category CRUD
        .route(
            "/category/new",
            get(pages::new_category_form).post(pages::create_category),
        )
        .route(
            "/category/edit/{id}",
            get(pages::edit_category_form).post(pages::update_category),
        )
        .route("/category/delete/{id}", get(pages::delete_category))
        // Item CRUD
        .route(
            "/item/new",
            get(pages::new_item_form).post(pages::create_item),
        )
        .route(
            "/item/edit/{id}",
            get(pages::edit_item_form).post(pages::update_item),
        )
        .route("/item/delete/{id}", get(pages::delete_item))
        // Public catalog pages (dynamic segments come last)
        .route("/{category_name}", get(pages::show_category))
        .route("/{category_name}/items.json", get(json::category_items))
        .route("/{category_name}/{item_name}", get(pages::show_item))
        .route("/{category_name}/{item_name}/item.json", get(json::item))
        .nest_service("/uploads", ServeDir::new(state.images.root()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
