//! Repository layer
//!
//! Trait-based data access for each entity, with SQLx implementations.
//! Handlers never touch SQL directly: services receive `Arc<dyn ...Repository>`
//! handles, which also keeps the business logic testable against the
//! in-memory pool.

mod category;
mod item;
mod session;
mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use item::{ItemRepository, SqlxItemRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
