//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Category entity. Categories group items and belong to the user who
/// created them; only that author may rename or delete them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Category name (unique)
    pub name: String,
    /// Creating user's id
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category. The ID is assigned by the database.
    pub fn new(name: String, author_id: i64) -> Self {
        Self {
            id: 0,
            name,
            author_id,
            created_at: Utc::now(),
        }
    }

    /// Check if the given user is this category's author
    pub fn is_author(&self, user: &User) -> bool {
        self.author_id == user.id
    }
}
