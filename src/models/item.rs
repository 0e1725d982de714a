//! Item model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Item entity. An item belongs to one category and one author; the stored
/// `image` filename, when present, points at a file in the upload directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Unique identifier
    pub id: i64,
    /// Item name (unique within its category)
    pub name: String,
    /// Item description
    pub body: String,
    /// Publication timestamp
    pub pub_date: DateTime<Utc>,
    /// Creating user's id
    pub author_id: i64,
    /// Owning category's id
    pub category_id: i64,
    /// Stored image filename, if an image was uploaded
    pub image: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Check if the given user is this item's author
    pub fn is_author(&self, user: &User) -> bool {
        self.author_id == user.id
    }
}

/// Input for creating a new item
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    /// Item name
    pub name: String,
    /// Item description
    pub body: String,
    /// Owning category
    pub category_id: i64,
    /// Publication timestamp; defaults to the creation time when omitted
    pub pub_date: Option<DateTime<Utc>>,
    /// Stored image filename
    pub image: Option<String>,
}

/// Input for partially updating an item
#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional)
    pub body: Option<String>,
    /// New category (optional)
    pub category_id: Option<i64>,
    /// New stored image filename (optional; replaces the previous one)
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_author() {
        let mut author = User::new("a".to_string(), "a@example.com".to_string(), None);
        author.id = 3;
        let mut other = User::new("b".to_string(), "b@example.com".to_string(), None);
        other.id = 4;

        let now = Utc::now();
        let item = Item {
            id: 1,
            name: "Tent".to_string(),
            body: "Good shelter even on the rainy days".to_string(),
            pub_date: now,
            author_id: 3,
            category_id: 1,
            image: None,
            created_at: now,
            updated_at: now,
        };

        assert!(item.is_author(&author));
        assert!(!item.is_author(&other));
    }
}
