/// Domain models shared by the store, services and handlers
pub mod comment;
pub mod file;
pub mod message;
pub mod ticket;
pub mod user;

pub use comment::{Comment, CommentView};
pub use file::{AttachmentRef, FileOwner, FileRecord, NewFile};
pub use message::{Message, MessageView};
pub use ticket::{NewTicket, Ticket, TicketStatus, TicketUpdate};
pub use user::{NewUserDefaults, Role, User};
