//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// User document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub verify_code: String,
    pub verify_code_expiry: DateTime<Utc>,
    pub is_verified: bool,
    pub is_accepting_message: bool,
    pub messages: Vec<Message>,
}

/// New user creation payload.
///
/// Every field is optional so that missing values surface as validation
/// errors with their declared messages instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub verify_code: Option<String>,
    pub verify_code_expiry: Option<DateTime<Utc>>,
    pub is_verified: Option<bool>,
    pub is_accepting_message: Option<bool>,
    #[serde(default)]
    pub messages: Vec<super::message::NewMessage>,
}

/// User update payload.
///
/// Serializes only the fields that are present, so it doubles as the partial
/// document merged into the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_code_expiry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_accepting_message: Option<bool>,
}

impl UpdateUser {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.verify_code.is_none()
            && self.verify_code_expiry.is_none()
            && self.is_verified.is_none()
            && self.is_accepting_message.is_none()
    }

    /// Overwrite the fields of `user` that are present in this payload
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username.clone_from(username);
        }
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(password) = &self.password {
            user.password.clone_from(password);
        }
        if let Some(verify_code) = &self.verify_code {
            user.verify_code.clone_from(verify_code);
        }
        if let Some(expiry) = self.verify_code_expiry {
            user.verify_code_expiry = expiry;
        }
        if let Some(is_verified) = self.is_verified {
            user.is_verified = is_verified;
        }
        if let Some(accepting) = self.is_accepting_message {
            user.is_accepting_message = accepting;
        }
    }
}

/// Lookup criteria for a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Username(String),
    Email(String),
    UsernameOrEmail(String),
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Username(username) => user.username == *username,
            UserFilter::Email(email) => user.email == *email,
            UserFilter::UsernameOrEmail(value) => user.username == *value || user.email == *value,
        }
    }
}
