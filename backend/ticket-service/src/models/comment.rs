use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment joined to its author's current email and name.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub author_email: String,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn author_display(&self) -> &str {
        self.author_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.author_email)
    }
}
