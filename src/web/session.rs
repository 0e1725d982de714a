//! Session middleware and request context
//!
//! Loads (or lazily creates) the server-side session for every request,
//! derives the current user from it, and exposes both to handlers through
//! the `SessionContext` extractor. New sessions get their cookie appended
//! to the response on the way out.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::models::{Session, User};
use crate::web::error::PageError;
use crate::web::state::AppState;

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";

/// Session cookie lifetime, kept in step with the session row expiration
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Per-request session context: the session row and the user derived from
/// it (None when anonymous).
#[derive(Clone)]
pub struct SessionContext {
    pub session: Session,
    pub user: Option<User>,
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| {
                PageError::Internal(anyhow::anyhow!("Session middleware not installed"))
            })
    }
}

/// Extract the session token from the request cookies
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(token) = cookie.strip_prefix("session=") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Session middleware.
///
/// A request without a (valid) session cookie gets a fresh anonymous
/// session; the Set-Cookie header is appended to the response in that case.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, PageError> {
    let token = extract_session_token(request.headers());

    let (session, fresh) = match token {
        Some(token) => match state
            .sessions
            .get(&token)
            .await
            .map_err(PageError::Internal)?
        {
            Some(session) => (session, false),
            None => (
                state.sessions.open().await.map_err(PageError::Internal)?,
                true,
            ),
        },
        None => (
            state.sessions.open().await.map_err(PageError::Internal)?,
            true,
        ),
    };

    let user = match session.user_id {
        Some(user_id) => state
            .users
            .get_by_id(user_id)
            .await
            .ok()
            .flatten(),
        None => None,
    };

    let session_id = session.id.clone();
    request
        .extensions_mut()
        .insert(SessionContext { session, user });

    let mut response = next.run(request).await;

    if fresh {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, session_id, SESSION_COOKIE_MAX_AGE_SECS
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    Ok(response)
}

/// Gate for handlers that change content.
///
/// Anonymous requests get the login flash set and are bounced to `/login`
/// through `PageError::LoginRequired`; no error status is involved.
pub async fn require_login(
    state: &AppState,
    ctx: &mut SessionContext,
) -> Result<User, PageError> {
    match ctx.user.clone() {
        Some(user) => Ok(user),
        None => {
            state
                .sessions
                .set_flash(&mut ctx.session, "You need to login to change the content")
                .await
                .map_err(PageError::Internal)?;
            Err(PageError::LoginRequired)
        }
    }
}
