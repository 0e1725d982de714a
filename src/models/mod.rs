//! Data models
//!
//! Database entities for the minilog catalog (User, Session, Category, Item)
//! plus the input types used by the service layer.

mod category;
mod item;
mod session;
mod user;

pub use category::Category;
pub use item::{CreateItemInput, Item, UpdateItemInput};
pub use session::Session;
pub use user::User;
