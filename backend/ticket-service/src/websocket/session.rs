/// Per-connection WebSocket actor
///
/// Decodes inbound frames, hands them to the ingestion pipeline and writes
/// every [`ServerEvent`] routed to this session back to the socket.
use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::message_types::{ClientEvent, ServerEvent};
use super::rooms::{RoomManager, SessionId};
use crate::services::{IngestOutcome, IngestionPipeline};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WsSession {
    id: SessionId,
    rooms: RoomManager,
    pipeline: IngestionPipeline,
    outbound: Option<UnboundedReceiver<ServerEvent>>,
    hb: Instant,
}

impl WsSession {
    pub fn new(
        id: SessionId,
        outbound: UnboundedReceiver<ServerEvent>,
        rooms: RoomManager,
        pipeline: IngestionPipeline,
    ) -> Self {
        Self {
            id,
            rooms,
            pipeline,
            outbound: Some(outbound),
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(session_id = %act.id, "websocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_event(&self, event: ClientEvent) {
        let session = self.id;
        let pipeline = self.pipeline.clone();

        match event {
            ClientEvent::Join(request) => {
                actix::spawn(async move {
                    if let Err(e) = pipeline.join(session, request).await {
                        tracing::error!(session_id = %session, error = %e, "history replay failed");
                        pipeline
                            .rooms()
                            .send_to(session, ServerEvent::error("failed to load history"))
                            .await;
                    }
                });
            }
            ClientEvent::Chat(request) => {
                actix::spawn(async move {
                    match pipeline.ingest(Some(session), request).await {
                        Ok(IngestOutcome::Broadcast(msg)) => {
                            tracing::debug!(session_id = %session, message_id = msg.id, "chat ingested");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(session_id = %session, error = %e, "chat ingestion failed");
                            pipeline
                                .rooms()
                                .send_to(session, ServerEvent::error("failed to save message"))
                                .await;
                        }
                    }
                });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(session_id = %self.id, "websocket session started");
        self.hb(ctx);

        if let Some(rx) = self.outbound.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(session_id = %self.id, "websocket session stopped");

        let rooms = self.rooms.clone();
        let session = self.id;
        actix::spawn(async move {
            rooms.leave(session).await;
        });
    }
}

// Events routed to this session by the room manager
impl StreamHandler<ServerEvent> for WsSession {
    fn handle(&mut self, event: ServerEvent, ctx: &mut Self::Context) {
        ctx.text(event.to_json());
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {}
}

// WebSocket protocol messages
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => self.handle_event(event),
                    // Malformed frames are ignored.
                    Err(e) => tracing::debug!(session_id = %self.id, error = %e, "unparseable frame"),
                }
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(session_id = %self.id, "binary websocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(session_id = %self.id, ?reason, "websocket close received");
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "websocket protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}
