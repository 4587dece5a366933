use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stored attachment metadata. Lifetime is tied to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub size: i64,
    pub message_id: Option<i64>,
    pub ticket_id: Option<i64>,
    pub uploaded_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// What a file belongs to. A file has at most one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOwner {
    Message(i64),
    Ticket(i64),
}

impl FileOwner {
    pub fn message_id(&self) -> Option<i64> {
        match self {
            FileOwner::Message(id) => Some(*id),
            FileOwner::Ticket(_) => None,
        }
    }

    pub fn ticket_id(&self) -> Option<i64> {
        match self {
            FileOwner::Ticket(id) => Some(*id),
            FileOwner::Message(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner: FileOwner,
    pub filename: String,
    pub url: String,
    pub size: i64,
    pub uploaded_by: Option<i64>,
}

/// Outward-facing reference to an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
}
