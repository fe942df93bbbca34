/// Comment handlers - HTTP endpoints for comment operations
use crate::auth::Actor;
use crate::error::{AppError, Result};
use crate::services::moderation::ModerationGate;
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub post: Option<Uuid>,
}

/// Request body for creating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post: Uuid,
    pub parent_id: Option<Uuid>,
    #[validate(
        length(min = 1, max = 10000),
        custom(function = "crate::handlers::validate_not_blank")
    )]
    pub content: String,
}

/// Request body for updating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(
        length(min = 1, max = 10000),
        custom(function = "crate::handlers::validate_not_blank")
    )]
    pub content: String,
}

fn service(pool: &web::Data<PgPool>, moderation: web::Data<ModerationGate>) -> CommentService {
    CommentService::new(pool.get_ref().clone(), moderation.into_inner())
}

/// Top-level comments of a post with nested replies
pub async fn list_comments(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    query: web::Query<ListCommentsQuery>,
) -> Result<HttpResponse> {
    let post_id = query.post.ok_or_else(|| {
        AppError::Validation("The 'post' query parameter is required".to_string())
    })?;

    let forest = service(&pool, moderation).list_top_level(post_id).await?;
    Ok(HttpResponse::Ok().json(forest))
}

/// Get a single comment with its replies
pub async fn get_comment(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let node = service(&pool, moderation).get_comment(*comment_id).await?;
    Ok(HttpResponse::Ok().json(node))
}

/// Create a new comment or reply
pub async fn create_comment(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Actor,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let comment = service(&pool, moderation)
        .create_comment(&actor, req.post, req.parent_id, &req.content)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Update a comment (owner or admin)
pub async fn update_comment(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Actor,
    comment_id: web::Path<Uuid>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let comment = service(&pool, moderation)
        .update_comment(&actor, *comment_id, &req.content)
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// Delete a comment and its replies (owner or admin)
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Actor,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&pool, moderation)
        .delete_comment(&actor, *comment_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
