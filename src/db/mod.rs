//! Database layer
//!
//! SQLite access for minilog: pool creation, embedded code-based migrations,
//! trait-based repositories, and the demo-data seeder. The whole application
//! shares one `SqlitePool`, injected into repositories and services.

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod seed;

pub use pool::{create_pool, create_test_pool};
