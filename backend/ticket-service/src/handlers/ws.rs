use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use crate::state::AppState;
use crate::websocket::WsSession;

/// GET /api/v1/ws: upgrade to the realtime chat protocol
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (session_id, outbound) = state.rooms.connect().await;
    let session = WsSession::new(
        session_id,
        outbound,
        state.rooms.clone(),
        state.pipeline.clone(),
    );

    let response = ws::start(session, &req, stream);
    if response.is_err() {
        // Handshake failed; the actor never started.
        state.rooms.leave(session_id).await;
    }
    response
}
