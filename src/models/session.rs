//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side session record, keyed by the `session` cookie.
///
/// One typed row replaces the ambient session dictionary: identity, the
/// pending OAuth handshake state, the provider token needed for revocation,
/// and the one-shot flash message all live in explicit fields. Anonymous
/// sessions carry no `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (cookie token)
    pub id: String,
    /// Logged-in user, if any
    pub user_id: Option<i64>,
    /// CSRF state token issued when rendering the login page
    pub oauth_state: Option<String>,
    /// OAuth provider's user id, kept for revocation at logout
    pub provider_user_id: Option<String>,
    /// Long-lived OAuth access token
    pub provider_token: Option<String>,
    /// Pending one-shot flash message
    pub flash: Option<String>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Check if a user is logged in on this session
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Check if this session was established through an OAuth provider
    pub fn has_oauth_identity(&self) -> bool {
        self.provider_user_id.is_some() && self.provider_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in_hours: i64) -> Session {
        let now = Utc::now();
        Session {
            id: "token".to_string(),
            user_id: None,
            oauth_state: None,
            provider_user_id: None,
            provider_token: None,
            flash: None,
            expires_at: now + Duration::hours(expires_in_hours),
            created_at: now,
        }
    }

    #[test]
    fn test_expiration() {
        assert!(session(-1).is_expired());
        assert!(!session(1).is_expired());
    }

    #[test]
    fn test_authenticated() {
        let mut s = session(1);
        assert!(!s.is_authenticated());

        s.user_id = Some(7);
        assert!(s.is_authenticated());
    }

    #[test]
    fn test_oauth_identity_requires_both_fields() {
        let mut s = session(1);
        assert!(!s.has_oauth_identity());

        s.provider_user_id = Some("12345".to_string());
        assert!(!s.has_oauth_identity());

        s.provider_token = Some("token".to_string());
        assert!(s.has_oauth_identity());
    }
}
