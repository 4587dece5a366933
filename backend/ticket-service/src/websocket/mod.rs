/// Realtime chat channel: wire types, room registry and the per-connection actor
pub mod message_types;
pub mod rooms;
pub mod session;

pub use message_types::{ChatBroadcast, ClientEvent, ServerEvent};
pub use rooms::{RoomManager, SessionId};
pub use session::WsSession;
