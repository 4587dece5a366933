use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{AttachmentRef, MessageView};

/// Inbound realtime events from client to server
///
/// Frames look like `{"event": "join", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    Join(JoinRequest),
    Chat(ChatRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Raw value; validated by [`parse_ticket_id`]
    #[serde(default)]
    pub ticket_id: Option<Value>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub ticket_id: Option<Value>,
    /// Sender email
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub content: String,
    /// Client clock; the stored message uses the server timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub file: Option<ChatFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatFile {
    pub name: String,
    /// Base64-encoded bytes
    pub data: String,
    #[serde(default = "default_mimetype")]
    pub mimetype: String,
}

fn default_mimetype() -> String {
    "application/octet-stream".to_string()
}

/// Accept a positive integer ticket id given as a JSON number or a numeric
/// string. Anything else yields `None`.
pub fn parse_ticket_id(raw: Option<&Value>) -> Option<i64> {
    let id = match raw? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

/// Outbound realtime events from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    History(Vec<ChatBroadcast>),
    Chat(ChatBroadcast),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> String {
        // Only strings, integers and timestamps; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One chat message as clients see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcast {
    pub id: i64,
    /// Sender email
    pub user: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<AttachmentRef>,
}

impl From<&MessageView> for ChatBroadcast {
    fn from(m: &MessageView) -> Self {
        Self {
            id: m.id,
            user: m.sender_email.clone(),
            content: m.content.clone(),
            created_at: m.created_at,
            file: m.attachment(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}
