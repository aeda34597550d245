//! User and message document model
//!
//! Declares the `User` document and its embedded `Message` list, enforces
//! their field contract at write time, and hands out a single shared
//! [`UserModel`](model::UserModel) through a [`ModelRegistry`](registry::ModelRegistry).
//!
//! ```rust,no_run
//! use users::{models::NewUser, registry::ModelRegistry, store::MemoryUserStore};
//!
//! static REGISTRY: ModelRegistry<MemoryUserStore> = ModelRegistry::new();
//!
//! # async fn run() -> users::error::UserResult<()> {
//! let users = REGISTRY.user_model(MemoryUserStore::new);
//! let user = users
//!     .create(NewUser {
//!         username: Some("ada".to_string()),
//!         email: Some("ada@example.com".to_string()),
//!         password: Some("secret".to_string()),
//!         verify_code: Some("123456".to_string()),
//!         verify_code_expiry: Some(chrono::Utc::now()),
//!         ..Default::default()
//!     })
//!     .await?;
//! assert!(!user.is_verified);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod models;
pub mod registry;
pub mod schema;
pub mod store;
pub mod validation;
pub mod verification;
