/// Ticket state machine
///
/// Any status may move to any other through an explicit update. An update
/// that changes status or content triggers exactly one digest notification
/// carrying the ticket's full chronological history.
use chrono::{DateTime, Utc};

use crate::models::{AttachmentRef, CommentView, MessageView, Ticket, TicketStatus};
use crate::store::TicketUpdateOutcome;

/// A before/after pair for a digest-relevant field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Status {
        from: TicketStatus,
        to: TicketStatus,
    },
    Content {
        from: String,
        to: String,
    },
}

/// Status and content changes between two versions of a ticket. Title, CC
/// and company edits never trigger a digest.
pub fn detect_changes(previous: &Ticket, current: &Ticket) -> Vec<FieldChange> {
    let mut changes = Vec::with_capacity(2);
    if previous.status != current.status {
        changes.push(FieldChange::Status {
            from: previous.status,
            to: current.status,
        });
    }
    if previous.content != current.content {
        changes.push(FieldChange::Content {
            from: previous.content.clone(),
            to: current.content.clone(),
        });
    }
    changes
}

/// Changes that warrant a digest, or `None` when the update touched neither
/// status nor content.
pub fn digest_trigger(outcome: &TicketUpdateOutcome) -> Option<Vec<FieldChange>> {
    let changes = detect_changes(&outcome.previous, &outcome.current);
    (!changes.is_empty()).then_some(changes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HistoryKind {
    Comment,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub id: i64,
    pub contributor: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub attachment: Option<AttachmentRef>,
}

/// Everything a digest mail shows
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub ticket: Ticket,
    pub changes: Vec<FieldChange>,
    pub history: Vec<HistoryEntry>,
}

/// Interleave comments and chat messages ascending by creation time.
///
/// Ties fall back to kind then id so the order is stable across calls.
pub fn interleave_history(comments: &[CommentView], messages: &[MessageView]) -> Vec<HistoryEntry> {
    let mut history: Vec<HistoryEntry> = comments
        .iter()
        .map(|c| HistoryEntry {
            kind: HistoryKind::Comment,
            id: c.id,
            contributor: c.author_display().to_string(),
            created_at: c.created_at,
            text: c.content.clone(),
            attachment: None,
        })
        .chain(messages.iter().map(|m| HistoryEntry {
            kind: HistoryKind::Chat,
            id: m.id,
            contributor: m.sender_email.clone(),
            created_at: m.created_at,
            text: m.content.clone(),
            attachment: m.attachment(),
        }))
        .collect();

    history.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.kind.cmp(&b.kind))
            .then(a.id.cmp(&b.id))
    });
    history
}

pub fn compose_digest(
    ticket: Ticket,
    changes: Vec<FieldChange>,
    comments: &[CommentView],
    messages: &[MessageView],
) -> Digest {
    Digest {
        ticket,
        changes,
        history: interleave_history(comments, messages),
    }
}
