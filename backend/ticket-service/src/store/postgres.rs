use async_trait::async_trait;
use sqlx::PgPool;

use super::{TicketStore, TicketUpdateOutcome};
use crate::error::Result;
use crate::models::{
    Comment, CommentView, FileRecord, Message, MessageView, NewFile, NewTicket, NewUserDefaults,
    Ticket, TicketStatus, TicketUpdate, User,
};

/// PostgreSQL-backed [`TicketStore`]
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, email_notifications_enabled, extra_emails,
                   company_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, email_notifications_enabled, extra_emails,
                   company_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn upsert_user(&self, email: &str, defaults: &NewUserDefaults) -> Result<User> {
        // The no-op DO UPDATE makes RETURNING yield the existing row on conflict.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, name, role, email_notifications_enabled, extra_emails,
                      company_id, created_at
            "#,
        )
        .bind(email)
        .bind(&defaults.name)
        .bind(defaults.role)
        .bind(&defaults.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        let created = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (title, content, status, user_id, cc, company_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, content, status, user_id, cc, company_id, created_at
            "#,
        )
        .bind(&ticket.title)
        .bind(&ticket.content)
        .bind(TicketStatus::INITIAL)
        .bind(ticket.user_id)
        .bind(&ticket.cc)
        .bind(ticket.company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, title, content, status, user_id, cc, company_id, created_at
            FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn find_ticket_with_owner(&self, id: i64) -> Result<Option<(Ticket, User)>> {
        let Some(ticket) = self.find_ticket(id).await? else {
            return Ok(None);
        };

        // tickets.user_id is a NOT NULL foreign key, so the owner exists.
        let owner = self
            .find_user_by_id(ticket.user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(Some((ticket, owner)))
    }

    async fn list_tickets(&self, owner: Option<i64>) -> Result<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, title, content, status, user_id, cc, company_id, created_at
            FROM tickets
            WHERE $1::BIGINT IS NULL OR user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn update_ticket(
        &self,
        id: i64,
        fields: &TicketUpdate,
    ) -> Result<Option<TicketUpdateOutcome>> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, title, content, status, user_id, cc, company_id, created_at
            FROM tickets
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            tx.rollback().await?;
            return Ok(None);
        };

        let current = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                status = COALESCE($4, status),
                cc = COALESCE($5, cc),
                company_id = CASE WHEN $6 THEN $7 ELSE company_id END
            WHERE id = $1
            RETURNING id, title, content, status, user_id, cc, company_id, created_at
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(fields.status)
        .bind(&fields.cc)
        .bind(fields.company_id.is_some())
        .bind(fields.company_id.flatten())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(TicketUpdateOutcome { previous, current }))
    }

    async fn delete_ticket(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_message(
        &self,
        ticket_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (ticket_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, user_id, content, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn delete_message(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_messages(&self, ticket_id: i64) -> Result<Vec<MessageView>> {
        let messages = sqlx::query_as::<_, MessageView>(
            r#"
            SELECT m.id, m.ticket_id, m.user_id,
                   u.email AS sender_email, u.name AS sender_name,
                   m.content, m.created_at,
                   f.filename AS file_name, f.url AS file_url
            FROM messages m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN LATERAL (
                SELECT filename, url FROM files
                WHERE files.message_id = m.id
                ORDER BY files.id
                LIMIT 1
            ) f ON TRUE
            WHERE m.ticket_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn create_file(&self, file: &NewFile) -> Result<FileRecord> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (filename, url, size, message_id, ticket_id, uploaded_by_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, filename, url, size, message_id, ticket_id, uploaded_by_id, created_at
            "#,
        )
        .bind(&file.filename)
        .bind(&file.url)
        .bind(file.size)
        .bind(file.owner.message_id())
        .bind(file.owner.ticket_id())
        .bind(file.uploaded_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_ticket_files(&self, ticket_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, filename, url, size, message_id, ticket_id, uploaded_by_id, created_at
            FROM files
            WHERE ticket_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn create_comment(
        &self,
        ticket_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (ticket_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, user_id, content, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments SET content = $2
            WHERE id = $1
            RETURNING id, ticket_id, user_id, content, created_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.ticket_id, c.user_id,
                   u.email AS author_email, u.name AS author_name,
                   c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.ticket_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
