/// Comment CRUD
use std::sync::Arc;

use super::notifications::{NotificationJob, NotificationQueue};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentView};
use crate::store::TicketStore;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn TicketStore>,
    notifications: NotificationQueue,
}

impl CommentService {
    pub fn new(store: Arc<dyn TicketStore>, notifications: NotificationQueue) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn list(&self, ticket_id: i64) -> Result<Vec<CommentView>> {
        self.store.list_comments(ticket_id).await
    }

    pub async fn create(&self, ticket_id: i64, author_id: i64, content: &str) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("content is required".into()));
        }
        if self.store.find_ticket(ticket_id).await?.is_none() {
            return Err(AppError::NotFound("ticket"));
        }

        let comment = self
            .store
            .create_comment(ticket_id, author_id, content)
            .await?;
        self.notifications.enqueue(NotificationJob::CommentCreated {
            comment: comment.clone(),
        });
        Ok(comment)
    }

    pub async fn update(&self, id: i64, content: &str) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("content is required".into()));
        }
        self.store
            .update_comment(id, content)
            .await?
            .ok_or(AppError::NotFound("comment"))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.store.delete_comment(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("comment"))
        }
    }
}
