use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Agent => "AGENT",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user as seen by the collaboration engine. Credentials are never loaded.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub email_notifications_enabled: bool,
    pub extra_emails: Vec<String>,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to show next to a contribution, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Column values applied when an upsert has to insert a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserDefaults {
    pub name: Option<String>,
    pub role: Role,
    pub password_hash: String,
}

impl NewUserDefaults {
    /// Placeholder credential for auto-provisioned chat senders. Password
    /// hashes never start with `!`, so no login can match it.
    pub const GUEST_PASSWORD_HASH: &'static str = "!guest-no-login";

    pub fn guest() -> Self {
        Self {
            name: None,
            role: Role::Customer,
            password_hash: Self::GUEST_PASSWORD_HASH.to_string(),
        }
    }
}
