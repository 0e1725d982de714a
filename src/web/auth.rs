//! Authentication handlers
//!
//! Local signup/login/logout plus the Facebook OAuth handshake:
//!
//! anonymous -> state-issued (login page renders with a stored state token)
//!           -> token-exchanged (short-lived token swapped at the provider)
//!           -> profile-fetched (id, name, email, picture)
//!           -> session-established (local user bound to the session)
//!
//! Any failing step aborts with a 401 JSON body and no session; logout of
//! an OAuth session revokes the grant at the provider first.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use tera::Context;

use crate::services::{SignupInput, UserServiceError};
use crate::web::error::{ApiError, PageError};
use crate::web::forms::{LoginForm, SignupForm};
use crate::web::session::SessionContext;
use crate::web::state::AppState;
use crate::web::templates::render_page;

fn signup_context(form: &SignupForm, errors: &crate::web::forms::FieldErrors) -> Context {
    let mut context = Context::new();
    context.insert("name", &form.name);
    context.insert("email", &form.email);
    context.insert("errors", errors);
    context
}

/// GET /signup
pub async fn signup_form(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let context = signup_context(&SignupForm::default(), &Default::default());
    Ok(render_page(&state, &mut ctx, "signup.html", context)
        .await?
        .into_response())
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    let mut errors = form.validate();

    if errors.is_empty() {
        let input = SignupInput::new(form.name.clone(), form.email.clone(), form.password.clone());
        match state.users.signup(input).await {
            Ok(_) => {
                state
                    .sessions
                    .set_flash(&mut ctx.session, "Thanks for registering")
                    .await
                    .map_err(PageError::Internal)?;
                return Ok(Redirect::to("/").into_response());
            }
            Err(UserServiceError::EmailTaken(email)) => {
                errors.insert("email", format!("'{}' is already registered.", email));
            }
            Err(UserServiceError::ValidationError(message)) => {
                errors.insert("email", message);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let context = signup_context(&form, &errors);
    Ok(render_page(&state, &mut ctx, "signup.html", context)
        .await?
        .into_response())
}

fn login_context(
    form: &LoginForm,
    errors: &crate::web::forms::FieldErrors,
    error: Option<&str>,
    state_token: &str,
    app_id: &str,
) -> Context {
    let mut context = Context::new();
    context.insert("email", &form.email);
    context.insert("errors", errors);
    context.insert("error", &error);
    context.insert("oauth_state", state_token);
    context.insert("facebook_app_id", app_id);
    context
}

/// GET /login
///
/// Rendering the page issues a fresh OAuth state token; the page embeds it
/// for the /fbconnect post-back.
pub async fn login_form(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    let state_token = state
        .sessions
        .issue_oauth_state(&mut ctx.session)
        .await
        .map_err(PageError::Internal)?;

    let context = login_context(
        &LoginForm::default(),
        &Default::default(),
        None,
        &state_token,
        &state.facebook_app_id(),
    );
    Ok(render_page(&state, &mut ctx, "login.html", context)
        .await?
        .into_response())
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let errors = form.validate();
    let mut error = None;

    if errors.is_empty() {
        match state.users.login(&form.email, &form.password).await {
            Ok(user) => {
                state
                    .sessions
                    .attach_user(&mut ctx.session, user.id)
                    .await
                    .map_err(PageError::Internal)?;
                state
                    .sessions
                    .set_flash(&mut ctx.session, "You were logged in")
                    .await
                    .map_err(PageError::Internal)?;
                return Ok(Redirect::to("/").into_response());
            }
            Err(UserServiceError::InvalidCredentials) => {
                error = Some("User not valid");
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Failed attempts get a fresh state token for the retry
    let state_token = state
        .sessions
        .issue_oauth_state(&mut ctx.session)
        .await
        .map_err(PageError::Internal)?;

    let context = login_context(
        &form,
        &errors,
        error,
        &state_token,
        &state.facebook_app_id(),
    );
    Ok(render_page(&state, &mut ctx, "login.html", context)
        .await?
        .into_response())
}

/// GET /logout
///
/// An OAuth-established session revokes the provider grant first; revoke
/// failures are logged but never block the local logout.
pub async fn logout(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response, PageError> {
    if ctx.session.has_oauth_identity() {
        if let (Some(provider_user_id), Some(token)) = (
            ctx.session.provider_user_id.clone(),
            ctx.session.provider_token.clone(),
        ) {
            if let Err(e) = state.facebook.revoke(&provider_user_id, &token).await {
                tracing::warn!("OAuth revoke failed: {}", e);
            }
        }
    }

    state
        .sessions
        .clear_identity(&mut ctx.session)
        .await
        .map_err(PageError::Internal)?;
    state
        .sessions
        .set_flash(&mut ctx.session, "You were logged out")
        .await
        .map_err(PageError::Internal)?;

    Ok(Redirect::to("/").into_response())
}

/// Post-back body for the OAuth handshake
#[derive(Debug, Deserialize)]
pub struct FbConnectForm {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub access_token: String,
}

/// POST /fbconnect
pub async fn fbconnect(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Form(form): Form<FbConnectForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // State check first; the stored token is single-use either way
    let state_ok = state
        .sessions
        .consume_oauth_state(&mut ctx.session, &form.state)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    if !state_ok {
        return Err(ApiError::unauthorized("Invalid state parameter"));
    }

    if form.access_token.is_empty() {
        return Err(ApiError::unauthorized("Missing access token"));
    }

    let long_lived_token = state
        .facebook
        .exchange_token(&form.access_token)
        .await
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let profile = state
        .facebook
        .fetch_profile(&long_lived_token)
        .await
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let picture_url = state
        .facebook
        .fetch_picture_url(&long_lived_token)
        .await
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let user = state
        .users
        .find_or_create_oauth_user(&profile)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    state
        .sessions
        .attach_oauth_identity(&mut ctx.session, user.id, profile.id, long_lived_token)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    state
        .sessions
        .set_flash(&mut ctx.session, &format!("Welcome, {}", user.name))
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(json!({
        "message": format!("Welcome, {}", user.name),
        "picture": picture_url,
    })))
}
