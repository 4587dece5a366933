use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::TicketUpdate;
use crate::services::attachment::AttachmentPayload;
use crate::services::CreateTicket;
use crate::state::AppState;

/// Upper bound for one ticket attachment
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// GET /api/v1/tickets
pub async fn list_tickets(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    let owner = (!user.is_admin()).then_some(user.id);
    let tickets = state.tickets.list(owner).await?;
    Ok(HttpResponse::Ok().json(json!({ "tickets": tickets })))
}

/// POST /api/v1/tickets (multipart)
pub async fn create_ticket(
    state: web::Data<AppState>,
    user: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let input = read_ticket_form(payload).await?;
    let ticket = state.tickets.create(user.id, input).await?;
    Ok(HttpResponse::Ok().json(json!({ "ticket": ticket })))
}

/// GET /api/v1/tickets/{id}
pub async fn get_ticket(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let ticket = state.tickets.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ticket": ticket })))
}

/// PUT /api/v1/tickets/{id}
pub async fn update_ticket(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<TicketUpdate>,
) -> Result<HttpResponse> {
    let ticket = state
        .tickets
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "ticket": ticket })))
}

/// DELETE /api/v1/tickets/{id}
pub async fn delete_ticket(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    state.tickets.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// GET /api/v1/tickets/{id}/messages
pub async fn ticket_messages(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let messages = state.pipeline.history(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "messages": messages })))
}

/// Collect the ticket form: `title`, `content`, `cc` (JSON array),
/// `companyId` and an optional `file`.
async fn read_ticket_form(mut payload: Multipart) -> Result<CreateTicket> {
    let mut input = CreateTicket::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(format!("invalid form: {e}")))?;

        let disposition = field
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| ContentDisposition::from_raw(v).ok());
        let Some(disposition) = disposition else {
            continue;
        };
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let content_type = field
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("error reading form field: {e}")))?;
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest("upload exceeds 20MB limit".into()));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => {
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    input.file = Some(AttachmentPayload {
                        name: filename,
                        bytes: data,
                        content_type,
                    });
                }
            }
            "title" => input.title = text(data)?,
            "content" => input.content = text(data)?,
            "cc" => input.cc = parse_cc(&text(data)?)?,
            "companyId" => {
                let raw = text(data)?;
                input.company_id = match raw.trim() {
                    "" => None,
                    id => Some(
                        id.parse()
                            .map_err(|_| AppError::BadRequest("companyId must be a number".into()))?,
                    ),
                };
            }
            _ => {}
        }
    }

    Ok(input)
}

fn text(data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|_| AppError::BadRequest("form field is not UTF-8".into()))
}

/// `cc` must be a JSON array of strings; an empty field means no CC.
fn parse_cc(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<String>>(raw)
        .map_err(|_| AppError::BadRequest("cc must be a JSON array of email addresses".into()))
}
