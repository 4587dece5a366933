pub mod attachment;
pub mod comments;
pub mod ingestion;
pub mod mailer;
pub mod notifications;
pub mod recipients;
pub mod templates;
pub mod ticket_state;
pub mod tickets;

pub use attachment::{AttachmentService, ObjectStore, S3ObjectStore};
pub use comments::CommentService;
pub use ingestion::{IngestOutcome, IngestionPipeline};
pub use mailer::{MailTransport, OutboundMail, SmtpMailer};
pub use notifications::{
    NotificationDispatcher, NotificationJob, NotificationQueue, NotificationWorker,
};
pub use tickets::{CreateTicket, TicketService, TicketView};
