use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AttachmentRef;

/// A persisted chat message. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A chat message joined to its sender's current email and its attachment.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MessageView {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
}

impl MessageView {
    pub fn attachment(&self) -> Option<AttachmentRef> {
        match (&self.file_name, &self.file_url) {
            (Some(filename), Some(url)) => Some(AttachmentRef {
                filename: filename.clone(),
                url: url.clone(),
            }),
            _ => None,
        }
    }
}
