/// Tag handlers
use crate::auth::Actor;
use crate::error::Result;
use crate::services::TagService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchTagsQuery {
    pub q: Option<String>,
}

/// Get or create a tag by name: 201 when created, 200 when it already existed
pub async fn create_tag(
    pool: web::Data<PgPool>,
    actor: Actor,
    req: web::Json<CreateTagRequest>,
) -> Result<HttpResponse> {
    let (tag, created) = TagService::new((**pool).clone())
        .get_or_create(&req.name)
        .await?;

    tracing::debug!(user_id = %actor.id, tag_id = %tag.id, created, "tag requested");

    if created {
        Ok(HttpResponse::Created().json(tag))
    } else {
        Ok(HttpResponse::Ok().json(tag))
    }
}

pub async fn search_tags(
    pool: web::Data<PgPool>,
    query: web::Query<SearchTagsQuery>,
) -> Result<HttpResponse> {
    let tags = TagService::new((**pool).clone())
        .search(query.q.as_deref().unwrap_or(""))
        .await?;

    Ok(HttpResponse::Ok().json(tags))
}
