/// HTML bodies and subjects for notification mails
///
/// Every user-supplied string goes through [`escape_html`].
use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::ticket_state::{Digest, FieldChange, HistoryKind};
use crate::models::{AttachmentRef, Comment, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn company(ticket: &Ticket) -> String {
    ticket
        .company_id
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "-".to_string())
}

fn attachment_link(file: &AttachmentRef) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        escape_html(&file.url),
        escape_html(&file.filename)
    )
}

pub fn ticket_created(ticket: &Ticket) -> RenderedMail {
    RenderedMail {
        subject: format!("[Ticket Created] {}", ticket.title),
        html: format!(
            "<div><b>A ticket has been created.</b><br/>\
             Ticket: {}<br/>Title: {}<br/>Content: {}<br/>Company: {}<br/>Created: {}</div>",
            ticket.ticket_no(),
            escape_html(&ticket.title),
            escape_html(&ticket.content),
            company(ticket),
            timestamp(&ticket.created_at),
        ),
    }
}

pub fn comment_created(ticket: &Ticket, comment: &Comment, author: &str) -> RenderedMail {
    RenderedMail {
        subject: format!("[Ticket Comment] {}", ticket.title),
        html: format!(
            "<div><b>A comment was added to the ticket.</b><br/>\
             Title: {}<br/>Company: {}<br/><br/><b>Comment:</b><br/>{}<br/><br/>\
             Author: {}<br/>Written: {}</div>",
            escape_html(&ticket.title),
            company(ticket),
            escape_html(&comment.content),
            escape_html(author),
            timestamp(&comment.created_at),
        ),
    }
}

pub fn chat_message(
    ticket: &Ticket,
    sender: &str,
    content: &str,
    attachment: Option<&AttachmentRef>,
) -> RenderedMail {
    let file = attachment
        .map(|f| format!("<p>File: {}</p>", attachment_link(f)))
        .unwrap_or_default();

    RenderedMail {
        subject: "[Ticket Chat] New chat message".to_string(),
        html: format!(
            "<p>Ticket: {}</p><p>{}: {}</p>{}",
            escape_html(&ticket.title),
            escape_html(sender),
            escape_html(content),
            file,
        ),
    }
}

pub fn digest(digest: &Digest) -> RenderedMail {
    let ticket = &digest.ticket;
    let mut html = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<div><b>The ticket has been updated.</b><br/>\
         Ticket: {}<br/>Title: {}<br/>Status: {}<br/>Company: {}<br/>",
        ticket.ticket_no(),
        escape_html(&ticket.title),
        ticket.status,
        company(ticket),
    );

    for change in &digest.changes {
        match change {
            FieldChange::Status { from, to } => {
                let _ = write!(html, "Status: {from} &rarr; {to}<br/>");
            }
            FieldChange::Content { from, to } => {
                let _ = write!(
                    html,
                    "Previous content: {}<br/>New content: {}<br/>",
                    escape_html(from),
                    escape_html(to)
                );
            }
        }
    }

    html.push_str("<br/><b>History</b><ul>");
    if digest.history.is_empty() {
        html.push_str("<li>No comments or chat messages yet.</li>");
    }
    for entry in &digest.history {
        let label = match entry.kind {
            HistoryKind::Comment => "comment",
            HistoryKind::Chat => "chat",
        };
        let file = entry
            .attachment
            .as_ref()
            .map(|f| format!(" ({})", attachment_link(f)))
            .unwrap_or_default();
        let _ = write!(
            html,
            "<li>[{}] {} ({}): {}{}</li>",
            timestamp(&entry.created_at),
            escape_html(&entry.contributor),
            label,
            escape_html(&entry.text),
            file,
        );
    }
    html.push_str("</ul></div>");

    RenderedMail {
        subject: format!("[Ticket Updated] {}", ticket.title),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketStatus;
    use crate::services::ticket_state::HistoryEntry;
    use chrono::TimeZone;

    fn ticket() -> Ticket {
        Ticket {
            id: 42,
            title: "<script>x</script>".into(),
            content: "Tom & Jerry".into(),
            status: TicketStatus::Pending,
            user_id: 1,
            cc: vec![],
            company_id: Some(5),
            created_at: Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_ticket_created_escapes_body() {
        let mail = ticket_created(&ticket());
        assert_eq!(mail.subject, "[Ticket Created] <script>x</script>");
        assert!(mail.html.contains("&lt;script&gt;"));
        assert!(mail.html.contains("Tom &amp; Jerry"));
        assert!(mail.html.contains("TKT-20240229-0042"));
        assert!(mail.html.contains("Company: #5"));
    }

    #[test]
    fn test_chat_message_links_attachment() {
        let file = AttachmentRef {
            filename: "a.png".into(),
            url: "http://files/a.png".into(),
        };
        let mail = chat_message(&ticket(), "agent@x.com", "see attached", Some(&file));
        assert_eq!(mail.subject, "[Ticket Chat] New chat message");
        assert!(mail.html.contains("agent@x.com: see attached"));
        assert!(mail.html.contains("<a href=\"http://files/a.png\">a.png</a>"));
    }

    #[test]
    fn test_digest_lists_changes_and_history_in_order() {
        let at = |m| Utc.with_ymd_and_hms(2024, 3, 1, 10, m, 0).unwrap();
        let d = Digest {
            ticket: ticket(),
            changes: vec![FieldChange::Status {
                from: TicketStatus::Open,
                to: TicketStatus::Pending,
            }],
            history: vec![
                HistoryEntry {
                    kind: HistoryKind::Comment,
                    id: 1,
                    contributor: "u1@x.com".into(),
                    created_at: at(1),
                    text: "one".into(),
                    attachment: None,
                },
                HistoryEntry {
                    kind: HistoryKind::Chat,
                    id: 2,
                    contributor: "u2@x.com".into(),
                    created_at: at(2),
                    text: "two".into(),
                    attachment: None,
                },
            ],
        };
        let mail = digest(&d);
        assert_eq!(mail.subject, "[Ticket Updated] <script>x</script>");
        assert!(mail.html.contains("Status: OPEN &rarr; PENDING"));
        let one = mail.html.find("one").unwrap();
        let two = mail.html.find("two").unwrap();
        assert!(one < two);
        assert!(!mail.html.contains("Previous content"));
    }
}
