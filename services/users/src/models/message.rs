//! Message model, embedded in a user document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message entity. Lives only inside its owner's `messages` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// New message payload; `createdAt` falls back to the current time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            created_at: None,
        }
    }
}
