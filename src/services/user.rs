//! User service
//!
//! Business logic for user accounts:
//! - Local signup (email uniqueness + password hashing)
//! - Local login (password verification against the stored hash)
//! - Find-or-create for Facebook OAuth profiles

use crate::db::repositories::UserRepository;
use crate::models::User;
use crate::services::facebook::FacebookProfile;
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (wrong email, wrong password, or a
    /// passwordless OAuth account)
    #[error("User not valid")]
    InvalidCredentials,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user signup
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// User service for accounts and credentials
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Register a new local user.
    ///
    /// The password is hashed before storage; the plaintext never reaches
    /// the repository. Field-level constraints (name/email lengths, password
    /// confirmation) are enforced by the form layer before this is called.
    pub async fn signup(&self, input: SignupInput) -> Result<User, UserServiceError> {
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::EmailTaken(input.email));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(input.name, input.email, Some(password_hash));

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Log in with email and password.
    ///
    /// Succeeds iff the email exists, the account has a password hash, and
    /// the password verifies. OAuth-created accounts have no hash and are
    /// rejected here.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(UserServiceError::InvalidCredentials)?;

        let valid = verify_password(password, hash).context("Failed to verify password")?;

        if !valid {
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Find the local user matching an OAuth profile, creating one (with no
    /// password) if the profile email is unknown.
    pub async fn find_or_create_oauth_user(
        &self,
        profile: &FacebookProfile,
    ) -> Result<User, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_email(&profile.email)
            .await
            .context("Failed to get user by email")?
        {
            return Ok(user);
        }

        let user = User::new(profile.name.clone(), profile.email.clone(), None);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create OAuth user")?;

        tracing::info!(user_id = created.id, "Created user from OAuth profile");

        Ok(created)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }
}
