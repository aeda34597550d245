//! In-process document store
//!
//! Keeps every document behind one async mutex, so the uniqueness check and
//! the write that follows it are a single atomic step.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{UserStore, unique_value};
use crate::error::{UserError, UserResult};
use crate::models::{Message, UpdateUser, User, UserFilter};
use crate::schema::USER_SHAPE;

/// In-memory user store
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    documents: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(documents: &HashMap<Uuid, User>, user: &User) -> UserResult<()> {
    for field in USER_SHAPE.unique_fields() {
        let Some(value) = unique_value(user, field.name) else {
            continue;
        };

        let taken = documents
            .values()
            .any(|other| other.id != user.id && unique_value(other, field.name) == Some(value));
        if taken {
            return Err(UserError::Duplicate {
                field: field.name,
                value: value.to_string(),
            });
        }
    }

    Ok(())
}

impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> UserResult<()> {
        let mut documents = self.documents.lock().await;

        if documents.contains_key(&user.id) {
            return Err(UserError::Duplicate {
                field: "_id",
                value: user.id.to_string(),
            });
        }
        check_unique(&documents, user)?;

        documents.insert(user.id, user.clone());
        debug!("Inserted user document {}", user.id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let documents = self.documents.lock().await;
        Ok(documents.get(&id).cloned())
    }

    async fn find_one(&self, filter: &UserFilter) -> UserResult<Option<User>> {
        let documents = self.documents.lock().await;
        Ok(documents.values().find(|user| filter.matches(user)).cloned())
    }

    async fn update_fields(&self, id: Uuid, changes: &UpdateUser) -> UserResult<Option<User>> {
        let mut documents = self.documents.lock().await;

        let Some(mut user) = documents.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply_to(&mut user);
        check_unique(&documents, &user)?;

        documents.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn push_message(&self, id: Uuid, message: &Message) -> UserResult<Option<User>> {
        let mut documents = self.documents.lock().await;

        Ok(documents.get_mut(&id).map(|user| {
            user.messages.push(message.clone());
            user.clone()
        }))
    }

    async fn remove_message(&self, id: Uuid, index: usize) -> UserResult<Message> {
        let mut documents = self.documents.lock().await;

        let user = documents.get_mut(&id).ok_or(UserError::NotFound(id))?;
        if index >= user.messages.len() {
            return Err(UserError::MessageNotFound { index });
        }
        Ok(user.messages.remove(index))
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut documents = self.documents.lock().await;
        Ok(documents.remove(&id).is_some())
    }

    async fn count(&self) -> UserResult<u64> {
        let documents = self.documents.lock().await;
        Ok(documents.len() as u64)
    }
}
