//! Demo data seeder
//!
//! Backs the `populatedb` command: inserts a demo user, two categories, and
//! a handful of items so a fresh install has something to show.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::repositories::{
    CategoryRepository, ItemRepository, SqlxCategoryRepository, SqlxItemRepository,
    SqlxUserRepository, UserRepository,
};
use crate::models::{Category, Item, User};
use crate::services::password::hash_password;

/// Populate the database with demo data.
///
/// Idempotent per run: skipped entirely if the demo user already exists.
pub async fn populate(pool: &SqlitePool) -> Result<()> {
    let users = SqlxUserRepository::new(pool.clone());
    let categories = SqlxCategoryRepository::new(pool.clone());
    let items = SqlxItemRepository::new(pool.clone());

    if users.get_by_email("admin@example.com").await?.is_some() {
        tracing::info!("Demo data already present, skipping");
        return Ok(());
    }

    let admin = users
        .create(&User::new(
            "admin".to_string(),
            "admin@example.com".to_string(),
            Some(hash_password("password")?),
        ))
        .await?;

    let basketball = categories
        .create(&Category::new("Basketball".to_string(), admin.id))
        .await?;
    let camping = categories
        .create(&Category::new("Camping".to_string(), admin.id))
        .await?;

    let now = chrono::Utc::now();
    let demo_items = [
        ("Ball", "Perfectly round and bouncier than ever", basketball.id),
        ("Shoes", "Super light and comfortable", basketball.id),
        ("Tent", "Good shelter even on the rainy days", camping.id),
    ];

    for (name, body, category_id) in demo_items {
        items
            .create(&Item {
                id: 0,
                name: name.to_string(),
                body: body.to_string(),
                pub_date: now,
                author_id: admin.id,
                category_id,
                image: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    tracing::info!("Demo data added to the database");
    Ok(())
}
