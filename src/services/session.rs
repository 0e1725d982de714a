//! Session service
//!
//! Manages the server-side session lifecycle: opening anonymous sessions,
//! binding and clearing identities, single-use OAuth state tokens, and
//! one-shot flash messages.

use crate::db::repositories::SessionRepository;
use crate::models::Session;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 30;

/// Session service
pub struct SessionService {
    session_repo: Arc<dyn SessionRepository>,
    expiration_days: i64,
}

impl SessionService {
    /// Create a new session service
    pub fn new(session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            session_repo,
            expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new session service with custom expiration
    pub fn with_expiration(session_repo: Arc<dyn SessionRepository>, expiration_days: i64) -> Self {
        Self {
            session_repo,
            expiration_days,
        }
    }

    /// Open a new anonymous session
    pub async fn open(&self) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            oauth_state: None,
            provider_user_id: None,
            provider_token: None,
            flash: None,
            expires_at: now + Duration::days(self.expiration_days),
            created_at: now,
        };

        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")
    }

    /// Load a session by its cookie token.
    ///
    /// Expired rows are removed on sight and reported as absent.
    pub async fn get(&self, token: &str) -> Result<Option<Session>> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Bind a local login to the session
    pub async fn attach_user(&self, session: &mut Session, user_id: i64) -> Result<()> {
        session.user_id = Some(user_id);
        self.session_repo
            .update(session)
            .await
            .context("Failed to attach user to session")
    }

    /// Bind an OAuth login to the session: local user id plus the provider
    /// identity needed for revocation at logout.
    pub async fn attach_oauth_identity(
        &self,
        session: &mut Session,
        user_id: i64,
        provider_user_id: String,
        provider_token: String,
    ) -> Result<()> {
        session.user_id = Some(user_id);
        session.provider_user_id = Some(provider_user_id);
        session.provider_token = Some(provider_token);
        session.oauth_state = None;
        self.session_repo
            .update(session)
            .await
            .context("Failed to attach OAuth identity to session")
    }

    /// Clear the session's identity (local and OAuth), keeping the row so
    /// the logout flash survives the redirect.
    pub async fn clear_identity(&self, session: &mut Session) -> Result<()> {
        session.user_id = None;
        session.provider_user_id = None;
        session.provider_token = None;
        session.oauth_state = None;
        self.session_repo
            .update(session)
            .await
            .context("Failed to clear session identity")
    }

    /// Issue a fresh OAuth state token and store it on the session
    pub async fn issue_oauth_state(&self, session: &mut Session) -> Result<String> {
        let state = Uuid::new_v4().simple().to_string();
        session.oauth_state = Some(state.clone());
        self.session_repo
            .update(session)
            .await
            .context("Failed to store OAuth state")?;
        Ok(state)
    }

    /// Consume the stored OAuth state token, comparing it with the one the
    /// client posted back. The token is single-use: it is cleared whether or
    /// not it matches.
    pub async fn consume_oauth_state(&self, session: &mut Session, state: &str) -> Result<bool> {
        let stored = session.oauth_state.take();
        self.session_repo
            .update(session)
            .await
            .context("Failed to clear OAuth state")?;

        Ok(stored.as_deref() == Some(state) && !state.is_empty())
    }

    /// Set the one-shot flash message
    pub async fn set_flash(&self, session: &mut Session, message: &str) -> Result<()> {
        session.flash = Some(message.to_string());
        self.session_repo
            .update(session)
            .await
            .context("Failed to set flash message")
    }

    /// Take (and clear) the pending flash message
    pub async fn take_flash(&self, session: &mut Session) -> Result<Option<String>> {
        let flash = session.flash.take();
        if flash.is_some() {
            self.session_repo
                .update(session)
                .await
                .context("Failed to clear flash message")?;
        }
        Ok(flash)
    }

    /// Delete all expired sessions; called periodically from a background
    /// task.
    pub async fn cleanup_expired(&self) -> Result<i64> {
        self.session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")
    }
}
