/// Recipient resolution
///
/// Pure rules that turn a ticket, its owner and (for digests) its history into
/// the deduplicated address lists of one notification mail.
use std::collections::HashSet;

use crate::models::{CommentView, MessageView, Ticket, User};

/// Address lists of one outbound mail. Never contains duplicates across `to`
/// and `cc` once built through [`Recipients::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

impl Recipients {
    /// Dedupe both lists (exact string match, first occurrence wins) and drop
    /// from `cc` anything already in `to`. When `to` ends up empty the CC
    /// addresses are promoted so the mail still has a primary recipient.
    pub fn build<I, J>(to: I, cc: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let to: Vec<String> = to
            .into_iter()
            .filter(|addr| !addr.is_empty() && seen.insert(addr.clone()))
            .collect();
        let cc: Vec<String> = cc
            .into_iter()
            .filter(|addr| !addr.is_empty() && seen.insert(addr.clone()))
            .collect();

        if to.is_empty() {
            Self { to: cc, cc: Vec::new() }
        } else {
            Self { to, cc }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty()
    }

    /// Every address, `to` first
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.to.iter().chain(self.cc.iter()).map(String::as_str)
    }
}

/// The owner's opted-in set: primary email only when notifications are
/// enabled, extra addresses regardless of the flag.
pub fn opted_in_addresses(owner: &User) -> Vec<String> {
    let primary = owner
        .email_notifications_enabled
        .then(|| owner.email.clone());
    primary
        .into_iter()
        .chain(owner.extra_emails.iter().cloned())
        .collect()
}

/// ticket-created and comment-created
pub fn for_ticket_activity(ticket: &Ticket, owner: &User) -> Recipients {
    Recipients::build(opted_in_addresses(owner), ticket.cc.iter().cloned())
}

/// chat-message: owner's primary email unconditionally plus the sender.
/// The owner's opt-out flag is not consulted on this path.
pub fn for_chat(owner: &User, sender_email: &str) -> Recipients {
    let mut to = vec![owner.email.clone()];
    if sender_email != owner.email {
        to.push(sender_email.to_string());
    }
    Recipients::build(to, Vec::new())
}

/// status-changed / content-changed digest: the ticket-activity set plus
/// every distinct commenter and chat participant, by their current email.
pub fn for_digest(
    ticket: &Ticket,
    owner: &User,
    comments: &[CommentView],
    messages: &[MessageView],
) -> Recipients {
    let contributors = comments
        .iter()
        .map(|c| c.author_email.clone())
        .chain(messages.iter().map(|m| m.sender_email.clone()));

    Recipients::build(
        opted_in_addresses(owner).into_iter().chain(contributors),
        ticket.cc.iter().cloned(),
    )
}
