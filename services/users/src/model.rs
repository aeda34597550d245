//! The user model handle
//!
//! [`UserModel`] pairs the declared [`USER_SHAPE`] with a store and runs
//! every write through validation first. Handles are cheap to clone and
//! clones share identity (see [`UserModel::same_handle`]).

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{Message, NewMessage, NewUser, UpdateUser, User, UserFilter};
use crate::schema::{Shape, USER_SHAPE};
use crate::store::UserStore;
use crate::validation::{validate_changes, validate_new_message, validate_new_user};
use crate::verification::{self, VerificationCode, VerifyOutcome};

struct ModelInner<S> {
    shape: &'static Shape,
    store: S,
}

/// Shared handle to the user shape over a store
pub struct UserModel<S> {
    inner: Arc<ModelInner<S>>,
}

impl<S> Clone for UserModel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for UserModel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserModel")
            .field("shape", &self.inner.shape.name)
            .finish_non_exhaustive()
    }
}

impl<S: UserStore> UserModel<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                shape: &USER_SHAPE,
                store,
            }),
        }
    }

    pub fn shape(&self) -> &'static Shape {
        self.inner.shape
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// True when both handles come from the same registration
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Validate, apply defaults and insert a new user
    pub async fn create(&self, payload: NewUser) -> UserResult<User> {
        let user = validate_new_user(payload, Utc::now())?;
        self.store().insert(&user).await?;
        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        self.store().find_by_id(id).await
    }

    /// Look up by username. The query value is trimmed like the stored field.
    pub async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        self.store()
            .find_one(&UserFilter::Username(username.trim().to_string()))
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.store()
            .find_one(&UserFilter::Email(email.to_string()))
            .await
    }

    pub async fn find_by_username_or_email(&self, value: &str) -> UserResult<Option<User>> {
        self.store()
            .find_one(&UserFilter::UsernameOrEmail(value.trim().to_string()))
            .await
    }

    /// Validate the present fields of `changes` and write only those.
    ///
    /// Fields left out, including the message list, are never rewritten, so
    /// concurrent appends are kept.
    pub async fn update(&self, id: Uuid, changes: UpdateUser) -> UserResult<User> {
        let changes = validate_changes(changes)?;
        self.store()
            .update_fields(id, &changes)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Append a message; `createdAt` defaults to now
    pub async fn push_message(&self, id: Uuid, payload: NewMessage) -> UserResult<User> {
        let message = validate_new_message(payload, Utc::now())?;
        self.store()
            .push_message(id, &message)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Remove and return the message at `index`
    pub async fn remove_message(&self, id: Uuid, index: usize) -> UserResult<Message> {
        self.store().remove_message(id, index).await
    }

    /// Write a fresh verification code valid for `ttl`
    pub async fn issue_verification_code(&self, id: Uuid, ttl: Duration) -> UserResult<User> {
        let code = VerificationCode::issue(Utc::now(), ttl);
        self.update(
            id,
            UpdateUser {
                verify_code: Some(code.code),
                verify_code_expiry: Some(code.expires_at),
                ..Default::default()
            },
        )
        .await
    }

    /// Check `code` and mark the user verified when it is accepted
    pub async fn verify(&self, id: Uuid, code: &str) -> UserResult<VerifyOutcome> {
        let user = self.require(id).await?;
        let outcome = verification::check(&user, code, Utc::now());

        if outcome == VerifyOutcome::Verified && !user.is_verified {
            self.update(
                id,
                UpdateUser {
                    is_verified: Some(true),
                    ..Default::default()
                },
            )
            .await?;
            info!("Verified user {}", id);
        }

        Ok(outcome)
    }

    pub async fn set_accepting_messages(&self, id: Uuid, accepting: bool) -> UserResult<User> {
        self.update(
            id,
            UpdateUser {
                is_accepting_message: Some(accepting),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete the user and its messages. Returns `false` if it did not exist.
    pub async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let deleted = self.store().delete(id).await?;
        if deleted {
            info!("Deleted user {}", id);
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> UserResult<u64> {
        self.store().count().await
    }

    async fn require(&self, id: Uuid) -> UserResult<User> {
        self.find_by_id(id).await?.ok_or(UserError::NotFound(id))
    }
}
