/// Persistence boundary for the collaboration engine
///
/// Services talk to the database only through [`TicketStore`], so tests can
/// swap in an in-memory implementation.
use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Comment, CommentView, FileRecord, Message, MessageView, NewFile, NewTicket, NewUserDefaults,
    Ticket, TicketUpdate, User,
};

pub mod postgres;

pub use postgres::PgTicketStore;

/// Ticket row before and after an update, read inside the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketUpdateOutcome {
    pub previous: Ticket,
    pub current: Ticket,
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn find_user(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Insert-or-fetch keyed on the unique email constraint.
    ///
    /// Must be a single atomic statement: concurrent calls with the same new
    /// email yield the same row.
    async fn upsert_user(&self, email: &str, defaults: &NewUserDefaults) -> Result<User>;

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket>;

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>>;

    /// Ticket joined to its owning user
    async fn find_ticket_with_owner(&self, id: i64) -> Result<Option<(Ticket, User)>>;

    /// Newest first. `owner` restricts the listing to one user's tickets.
    async fn list_tickets(&self, owner: Option<i64>) -> Result<Vec<Ticket>>;

    /// Applies `fields` and returns the previous and current row, or `None`
    /// when the ticket does not exist.
    async fn update_ticket(
        &self,
        id: i64,
        fields: &TicketUpdate,
    ) -> Result<Option<TicketUpdateOutcome>>;

    /// Deletes the ticket and, by cascade, its messages, comments and files.
    async fn delete_ticket(&self, id: i64) -> Result<bool>;

    async fn create_message(&self, ticket_id: i64, user_id: i64, content: &str)
        -> Result<Message>;

    async fn delete_message(&self, id: i64) -> Result<bool>;

    /// Chat history ascending by creation time, ties broken by id.
    async fn list_messages(&self, ticket_id: i64) -> Result<Vec<MessageView>>;

    async fn create_file(&self, file: &NewFile) -> Result<FileRecord>;

    async fn list_ticket_files(&self, ticket_id: i64) -> Result<Vec<FileRecord>>;

    async fn create_comment(&self, ticket_id: i64, user_id: i64, content: &str)
        -> Result<Comment>;

    async fn update_comment(&self, id: i64, content: &str) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;

    /// Comments ascending by creation time, joined to their authors.
    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<CommentView>>;
}
