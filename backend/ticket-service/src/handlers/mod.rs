/// HTTP routes for ticket-service
use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::{JwtAuthMiddleware, JwtKeys};

pub mod comments;
pub mod tickets;
pub mod ws;

/// Health check
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "service": "ticket-service" }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Register every route. Everything except the health check needs a token.
pub fn configure_routes(cfg: &mut web::ServiceConfig, keys: Arc<JwtKeys>) {
    cfg.app_data(json_config())
        .route("/api/v1/health", web::get().to(health))
        .service(
            web::scope("/api/v1")
                .wrap(JwtAuthMiddleware::new(keys))
                .service(
                    web::scope("/tickets")
                        .route("", web::get().to(tickets::list_tickets))
                        .route("", web::post().to(tickets::create_ticket))
                        .route("/{id}", web::get().to(tickets::get_ticket))
                        .route("/{id}", web::put().to(tickets::update_ticket))
                        .route("/{id}", web::delete().to(tickets::delete_ticket))
                        .route("/{id}/messages", web::get().to(tickets::ticket_messages)),
                )
                .service(
                    web::scope("/comments")
                        .route("", web::post().to(comments::create_comment))
                        .route(
                            "/ticket/{ticket_id}",
                            web::get().to(comments::list_comments),
                        )
                        .route("/{id}", web::put().to(comments::update_comment))
                        .route("/{id}", web::delete().to(comments::delete_comment)),
                )
                .route("/ws", web::get().to(ws::ws_index)),
        );
}
