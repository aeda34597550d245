//! Document stores backing the user model
//!
//! A store persists whole user documents and enforces the unique fields
//! declared on [`USER_SHAPE`](crate::schema::USER_SHAPE). Validation happens
//! before a document reaches the store.

use uuid::Uuid;

use crate::error::UserResult;
use crate::models::{Message, UpdateUser, User, UserFilter};

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Persistence operations for user documents
pub trait UserStore: Send + Sync + 'static {
    /// Insert a new document. Fails with `Duplicate` on a unique field clash.
    fn insert(&self, user: &User) -> impl Future<Output = UserResult<()>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = UserResult<Option<User>>> + Send;

    fn find_one(
        &self,
        filter: &UserFilter,
    ) -> impl Future<Output = UserResult<Option<User>>> + Send;

    /// Overwrite only the fields present in `changes`, in a single write.
    /// Unique fields are checked against other documents. Returns the updated
    /// document, or `None` if the user does not exist.
    fn update_fields(
        &self,
        id: Uuid,
        changes: &UpdateUser,
    ) -> impl Future<Output = UserResult<Option<User>>> + Send;

    /// Append a message to the user's list in a single write.
    /// Returns the updated document, or `None` if the user does not exist.
    fn push_message(
        &self,
        id: Uuid,
        message: &Message,
    ) -> impl Future<Output = UserResult<Option<User>>> + Send;

    /// Remove the message at `index` in a single write and return it.
    /// Fails with `NotFound` or `MessageNotFound`.
    fn remove_message(
        &self,
        id: Uuid,
        index: usize,
    ) -> impl Future<Output = UserResult<Message>> + Send;

    /// Remove the document and everything embedded in it
    fn delete(&self, id: Uuid) -> impl Future<Output = UserResult<bool>> + Send;

    fn count(&self) -> impl Future<Output = UserResult<u64>> + Send;
}

/// Value an update writes to a unique field, if it touches it
pub(crate) fn unique_change<'a>(changes: &'a UpdateUser, field: &str) -> Option<&'a str> {
    match field {
        "username" => changes.username.as_deref(),
        "email" => changes.email.as_deref(),
        _ => None,
    }
}

/// Value of a unique field on a typed user
pub(crate) fn unique_value<'a>(user: &'a User, field: &str) -> Option<&'a str> {
    match field {
        "username" => Some(&user.username),
        "email" => Some(&user.email),
        _ => None,
    }
}
