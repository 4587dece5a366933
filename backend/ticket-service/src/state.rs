/// Shared application state handed to every handler
use std::sync::Arc;

use crate::config::Config;
use crate::middleware::JwtKeys;
use crate::services::{
    AttachmentService, CommentService, IngestionPipeline, NotificationQueue, ObjectStore,
    TicketService,
};
use crate::store::TicketStore;
use crate::websocket::RoomManager;

#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomManager,
    pub pipeline: IngestionPipeline,
    pub tickets: TicketService,
    pub comments: CommentService,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Wire the services around one store, object store and queue.
    pub fn new(
        store: Arc<dyn TicketStore>,
        objects: Arc<dyn ObjectStore>,
        notifications: NotificationQueue,
        jwt: JwtKeys,
    ) -> Self {
        let rooms = RoomManager::new();
        let attachments = Arc::new(AttachmentService::new(objects));

        Self {
            pipeline: IngestionPipeline::new(
                store.clone(),
                attachments.clone(),
                rooms.clone(),
                notifications.clone(),
            ),
            tickets: TicketService::new(store.clone(), attachments, notifications.clone()),
            comments: CommentService::new(store, notifications),
            rooms,
            jwt: Arc::new(jwt),
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn TicketStore>,
        objects: Arc<dyn ObjectStore>,
        notifications: NotificationQueue,
    ) -> Self {
        Self::new(
            store,
            objects,
            notifications,
            JwtKeys::new(&config.auth.jwt_secret),
        )
    }
}
