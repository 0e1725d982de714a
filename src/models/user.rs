//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered user.
///
/// Users created through the Facebook OAuth flow carry no password hash and
/// cannot log in with the local form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2); None for OAuth-created users
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(name: String, email: String, password_hash: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user can log in with a password
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            Some("hashed".to_string()),
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.name, "testuser");
        assert_eq!(user.email, "test@example.com");
        assert!(user.has_password());
    }

    #[test]
    fn test_oauth_user_has_no_password() {
        let user = User::new("fb user".to_string(), "fb@example.com".to_string(), None);

        assert!(!user.has_password());
    }
}
