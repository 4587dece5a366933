/// Message ingestion pipeline
///
/// Turns an inbound chat event into a persisted message (plus attachment), a
/// room broadcast and a queued notification. Also serves history replay on
/// join.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::attachment::{AttachmentPayload, AttachmentService};
use super::notifications::{NotificationJob, NotificationQueue};
use crate::error::{AppError, Result};
use crate::models::{AttachmentRef, FileOwner, Message, NewFile, NewUserDefaults, User};
use crate::store::TicketStore;
use crate::websocket::message_types::{
    parse_ticket_id, ChatBroadcast, ChatFile, ChatRequest, JoinRequest, ServerEvent,
};
use crate::websocket::{RoomManager, SessionId};

/// What happened to one inbound chat event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Malformed event; nothing persisted, nothing broadcast
    Dropped,
    Broadcast(ChatBroadcast),
    /// Attachment failed; the message was rolled back and only the sender
    /// was told
    Rejected(String),
}

#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn TicketStore>,
    attachments: Arc<AttachmentService>,
    rooms: RoomManager,
    notifications: NotificationQueue,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn TicketStore>,
        attachments: Arc<AttachmentService>,
        rooms: RoomManager,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            store,
            attachments,
            rooms,
            notifications,
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Persisted chat history, oldest first.
    pub async fn history(&self, ticket_id: i64) -> Result<Vec<ChatBroadcast>> {
        let messages = self.store.list_messages(ticket_id).await?;
        Ok(messages.iter().map(ChatBroadcast::from).collect())
    }

    /// Subscribe the session and replay history to it. An invalid ticket id
    /// yields an empty history and no subscription.
    ///
    /// Chat broadcast while history is being read reaches the session after
    /// the history event, and only when the history does not already hold it.
    pub async fn join(&self, session: SessionId, request: JoinRequest) -> Result<Vec<ChatBroadcast>> {
        let ticket_id = match parse_ticket_id(request.ticket_id.as_ref()) {
            Some(ticket_id) if self.rooms.join(session, ticket_id).await => ticket_id,
            _ => {
                self.rooms
                    .send_to(session, ServerEvent::History(Vec::new()))
                    .await;
                return Ok(Vec::new());
            }
        };
        info!(
            session_id = %session,
            ticket_id,
            user_name = request.user_name.as_deref().unwrap_or("-"),
            "joined ticket chat"
        );

        let history = match self.history(ticket_id).await {
            Ok(history) => history,
            Err(e) => {
                self.rooms.cancel_replay(session, ticket_id).await;
                return Err(e);
            }
        };
        self.rooms
            .finish_replay(session, ticket_id, history.clone())
            .await;
        Ok(history)
    }

    /// Validate, persist, broadcast and enqueue a notification.
    ///
    /// `session` is the sending connection, used only for error replies.
    pub async fn ingest(
        &self,
        session: Option<SessionId>,
        request: ChatRequest,
    ) -> Result<IngestOutcome> {
        let Some(ticket_id) = parse_ticket_id(request.ticket_id.as_ref()) else {
            debug!("chat event without a valid ticket id dropped");
            return Ok(IngestOutcome::Dropped);
        };
        let Some(sender_email) = request
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        else {
            debug!(ticket_id, "chat event without a sender dropped");
            return Ok(IngestOutcome::Dropped);
        };

        let payload = match request.file.map(decode_file).transpose() {
            Ok(payload) => payload,
            Err(e) => return Ok(self.reject(session, ticket_id, e).await),
        };

        let sender = self
            .store
            .upsert_user(sender_email, &NewUserDefaults::guest())
            .await?;
        let message = self
            .store
            .create_message(ticket_id, sender.id, &request.content)
            .await?;

        let file = match payload {
            Some(payload) => match self.attach(&message, &sender, payload).await {
                Ok(file) => Some(file),
                Err(e) => {
                    // Compensate so no message exists without its attachment.
                    if let Err(del) = self.store.delete_message(message.id).await {
                        warn!(message_id = message.id, error = %del, "failed to roll back message");
                    }
                    return Ok(self.reject(session, ticket_id, e).await);
                }
            },
            None => None,
        };

        let broadcast = ChatBroadcast {
            id: message.id,
            user: sender.email.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
            file: file.clone(),
        };
        let delivered = self
            .rooms
            .broadcast(ticket_id, ServerEvent::Chat(broadcast.clone()))
            .await;
        debug!(ticket_id, message_id = message.id, delivered, "chat message broadcast");

        self.notifications.enqueue(NotificationJob::ChatMessage {
            ticket_id,
            sender_email: sender.email,
            content: message.content,
            attachment: file,
        });

        Ok(IngestOutcome::Broadcast(broadcast))
    }

    async fn attach(
        &self,
        message: &Message,
        sender: &User,
        payload: AttachmentPayload,
    ) -> Result<AttachmentRef> {
        let uploaded = self.attachments.upload(payload).await?;
        let record = self
            .store
            .create_file(&NewFile {
                owner: FileOwner::Message(message.id),
                filename: uploaded.safe_name,
                url: uploaded.url,
                size: uploaded.size,
                uploaded_by: Some(sender.id),
            })
            .await?;

        Ok(AttachmentRef {
            filename: record.filename,
            url: record.url,
        })
    }

    async fn reject(
        &self,
        session: Option<SessionId>,
        ticket_id: i64,
        error: AppError,
    ) -> IngestOutcome {
        let reason = format!("attachment upload failed: {error}");
        warn!(ticket_id, error = %error, "chat attachment rejected");
        if let Some(session) = session {
            self.rooms
                .send_to(session, ServerEvent::error(reason.clone()))
                .await;
        }
        IngestOutcome::Rejected(reason)
    }
}

fn decode_file(file: ChatFile) -> Result<AttachmentPayload> {
    let bytes = BASE64
        .decode(file.data.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid base64 attachment: {e}")))?;
    Ok(AttachmentPayload {
        name: file.name,
        bytes,
        content_type: file.mimetype,
    })
}
