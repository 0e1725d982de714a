//! Web error types
//!
//! Two error surfaces, matching the two kinds of routes:
//! - `PageError` for HTML pages: not-found renders a 404 page, a missing
//!   login turns into the redirect-to-login flow, internals answer 500.
//! - `ApiError` for JSON endpoints: a coded JSON error body with the
//!   matching status.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::{CategoryServiceError, ItemServiceError, UserServiceError};

/// Error type for HTML page handlers
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Lookup target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The handler needs a logged-in user; the flash has already been set
    #[error("Login required")]
    LoginRequired,

    /// Internal error
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Html(format!(
                    "<!doctype html><html><body><h1>Not Found</h1><p>{}</p><p><a href=\"/\">Back to the catalog</a></p></body></html>",
                    tera::escape_html(&what)
                )),
            )
                .into_response(),
            PageError::LoginRequired => Redirect::to("/login").into_response(),
            PageError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(
                        "<!doctype html><html><body><h1>Something went wrong</h1></body></html>"
                            .to_string(),
                    ),
                )
                    .into_response()
            }
        }
    }
}

impl From<CategoryServiceError> for PageError {
    fn from(e: CategoryServiceError) -> Self {
        match e {
            CategoryServiceError::NotFound(what) => PageError::NotFound(what),
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<ItemServiceError> for PageError {
    fn from(e: ItemServiceError) -> Self {
        match e {
            ItemServiceError::NotFound(what) => PageError::NotFound(what),
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<UserServiceError> for PageError {
    fn from(e: UserServiceError) -> Self {
        PageError::Internal(anyhow::Error::new(e))
    }
}

/// Error response body for JSON endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}
