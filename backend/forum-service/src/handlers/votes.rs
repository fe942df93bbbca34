/// Vote handlers
use crate::auth::Actor;
use crate::error::Result;
use crate::services::VoteService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub post: Uuid,
    /// Must be 1 or -1; anything else is rejected with 400
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CastVoteResponse {
    pub message: String,
    pub total_votes: i64,
    pub user_vote: i16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserVoteResponse {
    pub user_vote: i16,
}

/// Cast, flip or withdraw a vote
pub async fn cast_vote(
    pool: web::Data<PgPool>,
    actor: Actor,
    req: web::Json<CastVoteRequest>,
) -> Result<HttpResponse> {
    let outcome = VoteService::new((**pool).clone())
        .cast(&actor, req.post, req.value)
        .await?;

    Ok(HttpResponse::Ok().json(CastVoteResponse {
        message: outcome.action.message().to_string(),
        total_votes: outcome.total_votes,
        user_vote: outcome.user_vote,
    }))
}

/// The caller's current vote on a post
pub async fn get_user_vote(
    pool: web::Data<PgPool>,
    actor: Actor,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_vote = VoteService::new((**pool).clone())
        .user_vote(&actor, *post_id)
        .await?;

    Ok(HttpResponse::Ok().json(UserVoteResponse { user_vote }))
}
