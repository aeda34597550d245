//! Integration tests for the user model over the in-memory store
//!
//! These exercise the field contract end to end: defaults, uniqueness,
//! email format, required-field messages, embedded messages, verification
//! and idempotent registration.

use chrono::{Duration, Utc};
use users::error::{UserError, UserResult};
use users::model::UserModel;
use users::models::{Message, NewMessage, NewUser, UpdateUser, User, UserFilter};
use users::registry::ModelRegistry;
use users::store::{MemoryUserStore, UserStore};
use users::validation::ViolationKind;
use users::verification::VerifyOutcome;
use uuid::Uuid;

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: Some(username.to_string()),
        email: Some(email.to_string()),
        password: Some("correct horse".to_string()),
        verify_code: Some("482913".to_string()),
        verify_code_expiry: Some(Utc::now() + Duration::hours(1)),
        ..Default::default()
    }
}

fn model() -> UserModel<MemoryUserStore> {
    UserModel::new(MemoryUserStore::new())
}

/// Memory store whose reads and field writes stall, so that a concurrent
/// append lands while another operation is in flight
#[derive(Clone, Default)]
struct StallingStore {
    inner: MemoryUserStore,
}

const STALL: std::time::Duration = std::time::Duration::from_millis(50);

impl UserStore for StallingStore {
    async fn insert(&self, user: &User) -> UserResult<()> {
        self.inner.insert(user).await
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let found = self.inner.find_by_id(id).await;
        tokio::time::sleep(STALL).await;
        found
    }

    async fn find_one(&self, filter: &UserFilter) -> UserResult<Option<User>> {
        self.inner.find_one(filter).await
    }

    async fn update_fields(&self, id: Uuid, changes: &UpdateUser) -> UserResult<Option<User>> {
        tokio::time::sleep(STALL).await;
        self.inner.update_fields(id, changes).await
    }

    async fn push_message(&self, id: Uuid, message: &Message) -> UserResult<Option<User>> {
        self.inner.push_message(id, message).await
    }

    async fn remove_message(&self, id: Uuid, index: usize) -> UserResult<Message> {
        self.inner.remove_message(id, index).await
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> UserResult<u64> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn test_create_applies_defaults() {
    let users = model();

    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();
    assert!(!user.is_verified);
    assert!(user.is_accepting_message);
    assert!(user.messages.is_empty());

    let bob = users.create(new_user("bob", "bob@example.com")).await.unwrap();
    assert_ne!(user.id, bob.id);
    assert_eq!(users.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let users = model();
    users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let err = users
        .create(new_user("ada", "other@example.com"))
        .await
        .unwrap_err();
    match err {
        UserError::Duplicate { field, value } => {
            assert_eq!(field, "username");
            assert_eq!(value, "ada");
        }
        other => panic!("expected duplicate username, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_username_detected_after_trim() {
    let users = model();
    users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let err = users
        .create(new_user("  ada  ", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Duplicate { field: "username", .. }));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let users = model();
    users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let err = users
        .create(new_user("bob", "ada@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Duplicate { field: "email", .. }));
    assert_eq!(users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_email_format() {
    let users = model();

    let err = users
        .create(new_user("ada", "not-an-email"))
        .await
        .unwrap_err();
    let UserError::Validation(err) = err else {
        panic!("expected validation error");
    };
    let violation = err.violation("email").unwrap();
    assert_eq!(violation.kind, ViolationKind::Format);
    assert_eq!(violation.message, "Please fill a valid email address");

    assert!(users.create(new_user("ada", "a@b.co")).await.is_ok());
}

#[tokio::test]
async fn test_missing_password_message() {
    let users = model();

    let err = users
        .create(NewUser {
            password: None,
            ..new_user("ada", "ada@example.com")
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "User validation failed: password: Password is required"
    );
    assert_eq!(users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_required_fields_report_custom_messages() {
    let users = model();

    let err = users.create(NewUser::default()).await.unwrap_err();
    let UserError::Validation(err) = err else {
        panic!("expected validation error");
    };

    assert_eq!(err.message_for("username"), Some("Username is required"));
    assert_eq!(err.message_for("email"), Some("Email is required"));
    assert_eq!(err.message_for("password"), Some("Password is required"));
    assert_eq!(
        err.message_for("verifyCode"),
        Some("Verification code is required")
    );
    assert_eq!(
        err.message_for("verifyCodeExpiry"),
        Some("Verification code expiry is required")
    );
}

#[tokio::test]
async fn test_push_message_defaults_created_at() {
    let users = model();
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let before = Utc::now();
    let updated = users
        .push_message(user.id, NewMessage::new("hi"))
        .await
        .unwrap();
    let after = Utc::now();

    assert_eq!(updated.messages.len(), 1);
    let message = &updated.messages[0];
    assert_eq!(message.content, "hi");
    assert!(message.created_at >= before && message.created_at <= after);

    let stored = users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.messages, updated.messages);
}

#[tokio::test]
async fn test_messages_keep_order_and_can_be_removed() {
    let users = model();
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    for content in ["first", "second", "third"] {
        users
            .push_message(user.id, NewMessage::new(content))
            .await
            .unwrap();
    }

    let removed = users.remove_message(user.id, 1).await.unwrap();
    assert_eq!(removed.content, "second");

    let stored = users.find_by_id(user.id).await.unwrap().unwrap();
    let contents: Vec<_> = stored.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "third"]);
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let users = model();
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let err = users
        .push_message(user.id, NewMessage::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Validation(_)));
}

#[tokio::test]
async fn test_lookups() {
    let users = model();
    let user = users.create(new_user(" ada ", "ada@example.com")).await.unwrap();
    assert_eq!(user.username, "ada");

    assert_eq!(
        users.find_by_username("ada").await.unwrap().map(|u| u.id),
        Some(user.id)
    );
    assert_eq!(
        users.find_by_username(" ada").await.unwrap().map(|u| u.id),
        Some(user.id)
    );
    assert_eq!(
        users
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .map(|u| u.id),
        Some(user.id)
    );
    assert_eq!(
        users
            .find_by_username_or_email("ada@example.com")
            .await
            .unwrap()
            .map(|u| u.id),
        Some(user.id)
    );
    assert!(users.find_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_enforces_uniqueness() {
    let users = model();
    let ada = users.create(new_user("ada", "ada@example.com")).await.unwrap();
    users.create(new_user("bob", "bob@example.com")).await.unwrap();

    let err = users
        .update(
            ada.id,
            UpdateUser {
                username: Some("bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Duplicate { field: "username", .. }));

    let renamed = users
        .update(
            ada.id,
            UpdateUser {
                username: Some("  lovelace ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.username, "lovelace");
}

#[tokio::test]
async fn test_flags_flip_in_place() {
    let users = model();
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let updated = users.set_accepting_messages(user.id, false).await.unwrap();
    assert!(!updated.is_accepting_message);
    assert_eq!(updated.id, user.id);

    let stored = users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.is_accepting_message);
}

#[tokio::test]
async fn test_flag_flip_keeps_concurrent_message() {
    let users = UserModel::new(StallingStore::default());
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let (flipped, pushed) = tokio::join!(
        users.set_accepting_messages(user.id, false),
        users.push_message(user.id, NewMessage::new("hi")),
    );
    flipped.unwrap();
    pushed.unwrap();

    let stored = users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.is_accepting_message);
    assert_eq!(stored.messages.len(), 1);
    assert_eq!(stored.messages[0].content, "hi");
}

#[tokio::test]
async fn test_verify_keeps_concurrent_message() {
    let users = UserModel::new(StallingStore::default());
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let (outcome, pushed) = tokio::join!(
        users.verify(user.id, "482913"),
        users.push_message(user.id, NewMessage::new("hi")),
    );
    assert_eq!(outcome.unwrap(), VerifyOutcome::Verified);
    pushed.unwrap();

    let stored = users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.is_verified);
    assert_eq!(stored.messages.len(), 1);
}

#[tokio::test]
async fn test_verification_flow() {
    let users = model();
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();

    let issued = users
        .issue_verification_code(user.id, Duration::minutes(10))
        .await
        .unwrap();
    assert_ne!(issued.verify_code, "");
    assert!(issued.verify_code_expiry > Utc::now());

    assert_eq!(
        users.verify(user.id, "not-the-code").await.unwrap(),
        VerifyOutcome::InvalidCode
    );
    assert!(!users.find_by_id(user.id).await.unwrap().unwrap().is_verified);

    assert_eq!(
        users.verify(user.id, &issued.verify_code).await.unwrap(),
        VerifyOutcome::Verified
    );
    assert!(users.find_by_id(user.id).await.unwrap().unwrap().is_verified);
}

#[tokio::test]
async fn test_expired_code_rejected() {
    let users = model();
    let user = users
        .create(NewUser {
            verify_code_expiry: Some(Utc::now() - Duration::minutes(1)),
            ..new_user("ada", "ada@example.com")
        })
        .await
        .unwrap();

    assert_eq!(
        users.verify(user.id, "482913").await.unwrap(),
        VerifyOutcome::Expired
    );
    assert!(!users.find_by_id(user.id).await.unwrap().unwrap().is_verified);
}

#[tokio::test]
async fn test_delete_removes_user_and_messages() {
    let users = model();
    let user = users.create(new_user("ada", "ada@example.com")).await.unwrap();
    users
        .push_message(user.id, NewMessage::new("hi"))
        .await
        .unwrap();

    assert!(users.delete(user.id).await.unwrap());
    assert!(users.find_by_id(user.id).await.unwrap().is_none());
    assert_eq!(users.count().await.unwrap(), 0);

    // The username is free again once the owner is gone
    assert!(users.create(new_user("ada", "ada@example.com")).await.is_ok());
}

#[tokio::test]
async fn test_repeated_registration_yields_same_handle() {
    let registry = ModelRegistry::new();

    let first = registry.user_model(MemoryUserStore::new);
    let user = first.create(new_user("ada", "ada@example.com")).await.unwrap();

    let second = registry.user_model(MemoryUserStore::new);
    assert!(first.same_handle(&second));
    assert_eq!(second.find_by_id(user.id).await.unwrap(), Some(user));
}
