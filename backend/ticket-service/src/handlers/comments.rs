use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(range(min = 1))]
    pub ticket_id: i64,
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1))]
    pub content: String,
}

/// GET /api/v1/comments/ticket/{ticket_id}
pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let comments = state.comments.list(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "comments": comments })))
}

/// POST /api/v1/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    let comment = state
        .comments
        .create(body.ticket_id, user.id, &body.content)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "comment": comment })))
}

/// PUT /api/v1/comments/{id}
pub async fn update_comment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    let comment = state
        .comments
        .update(path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "comment": comment })))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    state.comments.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
