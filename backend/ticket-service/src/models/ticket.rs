use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Ticket lifecycle status.
///
/// There is no enforced ordering and no terminal state: any status may be
/// replaced by any other through an explicit update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    New,
    Open,
    Pending,
    OnHold,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::New,
        TicketStatus::Open,
        TicketStatus::Pending,
        TicketStatus::OnHold,
    ];

    /// Status assigned to freshly created tickets
    pub const INITIAL: TicketStatus = TicketStatus::Open;

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "NEW",
            TicketStatus::Open => "OPEN",
            TicketStatus::Pending => "PENDING",
            TicketStatus::OnHold => "ON_HOLD",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: TicketStatus,
    pub user_id: i64,
    pub cc: Vec<String>,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Human-readable ticket number, `TKT-YYYYMMDD-NNNN`.
    ///
    /// Derived from immutable columns (creation date and id) so it can never
    /// change once the row exists.
    pub fn ticket_no(&self) -> String {
        format!(
            "TKT-{:04}{:02}{:02}-{:04}",
            self.created_at.year(),
            self.created_at.month(),
            self.created_at.day(),
            self.id
        )
    }
}

/// Insert payload for a new ticket. Status always starts at [`TicketStatus::INITIAL`].
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub cc: Vec<String>,
    pub company_id: Option<i64>,
}

/// Partial update of a ticket. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub cc: Option<Vec<String>>,
    /// `Some(None)` clears the company association
    #[serde(default, deserialize_with = "double_option")]
    pub company_id: Option<Option<i64>>,
}

impl TicketUpdate {
    /// Blank title/content count as "not provided".
    pub fn normalized(mut self) -> Self {
        self.title = self.title.filter(|t| !t.trim().is_empty());
        self.content = self.content.filter(|c| !c.trim().is_empty());
        self
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
