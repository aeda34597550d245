//! User service models

pub mod message;
pub mod user;

// Re-export for convenience
pub use message::{Message, NewMessage};
pub use user::{NewUser, UpdateUser, User, UserFilter};
