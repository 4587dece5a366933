/// Notification queue, dispatcher and background worker
///
/// Producers enqueue a [`NotificationJob`] and move on. A single worker task
/// resolves recipients, renders the mail and hands it to the transport. Job
/// failures are logged and discarded; nothing is retried.
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::mailer::{MailTransport, OutboundMail};
use super::recipients::{self, Recipients};
use super::templates::{self, RenderedMail};
use super::ticket_state::{compose_digest, FieldChange};
use crate::error::Result;
use crate::models::{AttachmentRef, Comment, Ticket};
use crate::store::TicketStore;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationJob {
    TicketCreated {
        ticket: Ticket,
    },
    CommentCreated {
        comment: Comment,
    },
    ChatMessage {
        ticket_id: i64,
        sender_email: String,
        content: String,
        attachment: Option<AttachmentRef>,
    },
    /// Status and/or content changed; one digest per update
    TicketUpdated {
        ticket: Ticket,
        changes: Vec<FieldChange>,
    },
}

impl NotificationJob {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationJob::TicketCreated { .. } => "ticket_created",
            NotificationJob::CommentCreated { .. } => "comment_created",
            NotificationJob::ChatMessage { .. } => "chat_message",
            NotificationJob::TicketUpdated { .. } => "ticket_updated",
        }
    }

    pub fn ticket_id(&self) -> i64 {
        match self {
            NotificationJob::TicketCreated { ticket } => ticket.id,
            NotificationJob::CommentCreated { comment } => comment.ticket_id,
            NotificationJob::ChatMessage { ticket_id, .. } => *ticket_id,
            NotificationJob::TicketUpdated { ticket, .. } => ticket.id,
        }
    }
}

/// Producer handle. Cheap to clone.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    /// Create a bounded queue and the receiver its worker consumes.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue without waiting. A full or closed queue drops the job.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        let kind = job.kind();
        let ticket_id = job.ticket_id();
        match self.tx.try_send(job) {
            Ok(()) => {
                debug!(kind, ticket_id, "notification queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind, ticket_id, "notification queue full; dropping job");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(kind, ticket_id, "notification worker stopped; dropping job");
                false
            }
        }
    }
}

/// Resolves, renders and sends one job.
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn TicketStore>,
    mailer: Arc<dyn MailTransport>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn TicketStore>, mailer: Arc<dyn MailTransport>) -> Self {
        Self { store, mailer }
    }

    /// Returns whether a mail was handed to the transport.
    pub async fn dispatch(&self, job: NotificationJob) -> Result<bool> {
        let Some((recipients, rendered)) = self.prepare(job).await? else {
            return Ok(false);
        };
        if recipients.is_empty() {
            debug!(subject = %rendered.subject, "no recipients; skipping mail");
            return Ok(false);
        }

        let count = recipients.to.len() + recipients.cc.len();
        self.mailer
            .send(OutboundMail {
                to: recipients.to,
                cc: recipients.cc,
                subject: rendered.subject,
                html: rendered.html,
            })
            .await?;
        debug!(recipients = count, "notification handed to transport");
        Ok(true)
    }

    async fn prepare(&self, job: NotificationJob) -> Result<Option<(Recipients, RenderedMail)>> {
        match job {
            NotificationJob::TicketCreated { ticket } => {
                let Some(owner) = self.store.find_user_by_id(ticket.user_id).await? else {
                    return Ok(None);
                };
                Ok(Some((
                    recipients::for_ticket_activity(&ticket, &owner),
                    templates::ticket_created(&ticket),
                )))
            }
            NotificationJob::CommentCreated { comment } => {
                let Some((ticket, owner)) =
                    self.store.find_ticket_with_owner(comment.ticket_id).await?
                else {
                    return Ok(None);
                };
                let author = self
                    .store
                    .find_user_by_id(comment.user_id)
                    .await?
                    .map(|u| u.display_name().to_string())
                    .unwrap_or_else(|| format!("user #{}", comment.user_id));
                Ok(Some((
                    recipients::for_ticket_activity(&ticket, &owner),
                    templates::comment_created(&ticket, &comment, &author),
                )))
            }
            NotificationJob::ChatMessage {
                ticket_id,
                sender_email,
                content,
                attachment,
            } => {
                // A missing ticket only suppresses the mail.
                let Some((ticket, owner)) = self.store.find_ticket_with_owner(ticket_id).await?
                else {
                    debug!(ticket_id, "chat notification for unknown ticket skipped");
                    return Ok(None);
                };
                Ok(Some((
                    recipients::for_chat(&owner, &sender_email),
                    templates::chat_message(&ticket, &sender_email, &content, attachment.as_ref()),
                )))
            }
            NotificationJob::TicketUpdated { ticket, changes } => {
                let Some(owner) = self.store.find_user_by_id(ticket.user_id).await? else {
                    return Ok(None);
                };
                let comments = self.store.list_comments(ticket.id).await?;
                let messages = self.store.list_messages(ticket.id).await?;
                let recipients = recipients::for_digest(&ticket, &owner, &comments, &messages);
                let digest = compose_digest(ticket, changes, &comments, &messages);
                Ok(Some((recipients, templates::digest(&digest))))
            }
        }
    }
}

/// Background consumer of the notification queue
pub struct NotificationWorker {
    dispatcher: NotificationDispatcher,
    rx: mpsc::Receiver<NotificationJob>,
}

impl NotificationWorker {
    pub fn new(dispatcher: NotificationDispatcher, rx: mpsc::Receiver<NotificationJob>) -> Self {
        Self { dispatcher, rx }
    }

    /// Drain jobs until every queue handle is dropped.
    pub async fn run(mut self) {
        info!("notification worker started");
        while let Some(job) = self.rx.recv().await {
            let kind = job.kind();
            let ticket_id = job.ticket_id();
            if let Err(e) = self.dispatcher.dispatch(job).await {
                warn!(kind, ticket_id, error = %e, "notification failed; discarding");
            }
        }
        info!("notification worker stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
