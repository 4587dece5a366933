/// Ticket lifecycle operations behind the REST surface
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::attachment::{AttachmentPayload, AttachmentService};
use super::notifications::{NotificationJob, NotificationQueue};
use super::ticket_state::digest_trigger;
use crate::error::{AppError, Result};
use crate::models::{FileOwner, FileRecord, NewFile, NewTicket, Ticket, TicketUpdate};
use crate::store::TicketStore;

/// A ticket with its derived number and, for detail reads, its files
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub ticket_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileRecord>>,
}

impl TicketView {
    pub fn summary(ticket: Ticket) -> Self {
        Self {
            ticket_no: ticket.ticket_no(),
            ticket,
            files: None,
        }
    }

    pub fn detail(ticket: Ticket, files: Vec<FileRecord>) -> Self {
        Self {
            ticket_no: ticket.ticket_no(),
            ticket,
            files: Some(files),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTicket {
    pub title: String,
    pub content: String,
    pub cc: Vec<String>,
    pub company_id: Option<i64>,
    pub file: Option<AttachmentPayload>,
}

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
    attachments: Arc<AttachmentService>,
    notifications: NotificationQueue,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn TicketStore>,
        attachments: Arc<AttachmentService>,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            store,
            attachments,
            notifications,
        }
    }

    /// Newest first; `owner` limits the listing to one user's tickets.
    pub async fn list(&self, owner: Option<i64>) -> Result<Vec<TicketView>> {
        let tickets = self.store.list_tickets(owner).await?;
        Ok(tickets.into_iter().map(TicketView::summary).collect())
    }

    pub async fn get(&self, id: i64) -> Result<TicketView> {
        let ticket = self
            .store
            .find_ticket(id)
            .await?
            .ok_or(AppError::NotFound("ticket"))?;
        let files = self.store.list_ticket_files(id).await?;
        Ok(TicketView::detail(ticket, files))
    }

    /// Create a ticket in the initial status. If the attachment cannot be
    /// stored the ticket is deleted again and the upload error returned.
    pub async fn create(&self, owner_id: i64, input: CreateTicket) -> Result<TicketView> {
        if input.title.trim().is_empty() || input.content.trim().is_empty() {
            return Err(AppError::BadRequest("title and content are required".into()));
        }

        let ticket = self
            .store
            .create_ticket(&NewTicket {
                title: input.title,
                content: input.content,
                user_id: owner_id,
                cc: input.cc,
                company_id: input.company_id,
            })
            .await?;

        let mut files = Vec::new();
        if let Some(payload) = input.file {
            match self.attach(&ticket, owner_id, payload).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(ticket_id = ticket.id, error = %e, "ticket attachment failed; rolling back");
                    self.store.delete_ticket(ticket.id).await?;
                    return Err(match e {
                        storage @ AppError::Storage(_) => storage,
                        other => AppError::Storage(other.to_string()),
                    });
                }
            }
        }

        info!(ticket_id = ticket.id, ticket_no = %ticket.ticket_no(), "ticket created");
        self.notifications.enqueue(NotificationJob::TicketCreated {
            ticket: ticket.clone(),
        });

        Ok(TicketView::detail(ticket, files))
    }

    async fn attach(
        &self,
        ticket: &Ticket,
        uploader: i64,
        payload: AttachmentPayload,
    ) -> Result<FileRecord> {
        let uploaded = self.attachments.upload(payload).await?;
        self.store
            .create_file(&NewFile {
                owner: FileOwner::Ticket(ticket.id),
                filename: uploaded.safe_name,
                url: uploaded.url,
                size: uploaded.size,
                uploaded_by: Some(uploader),
            })
            .await
    }

    /// Apply a partial update. A status or content change enqueues one digest.
    pub async fn update(&self, id: i64, fields: TicketUpdate) -> Result<TicketView> {
        let fields = fields.normalized();
        let outcome = self
            .store
            .update_ticket(id, &fields)
            .await?
            .ok_or(AppError::NotFound("ticket"))?;

        if let Some(changes) = digest_trigger(&outcome) {
            info!(ticket_id = id, changes = changes.len(), "ticket changed; queueing digest");
            self.notifications.enqueue(NotificationJob::TicketUpdated {
                ticket: outcome.current.clone(),
                changes,
            });
        }

        Ok(TicketView::summary(outcome.current))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete_ticket(id).await? {
            return Err(AppError::NotFound("ticket"));
        }
        info!(ticket_id = id, "ticket deleted");
        Ok(())
    }
}
