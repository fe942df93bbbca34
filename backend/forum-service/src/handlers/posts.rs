/// Post handlers - HTTP endpoints for post operations
use crate::auth::Actor;
use crate::error::Result;
use crate::services::moderation::ModerationGate;
use crate::services::posts::{ListFilter, NewPost, PostChanges, PostListQuery, PostService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// `recent` (default), `highest_voted` or `user_posts`
    pub filter: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1), custom(function = "crate::handlers::validate_not_blank"))]
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1), custom(function = "crate::handlers::validate_not_blank"))]
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

fn service(pool: &web::Data<PgPool>, moderation: web::Data<ModerationGate>) -> PostService {
    PostService::new(pool.get_ref().clone(), moderation.into_inner())
}

/// List posts
pub async fn list_posts(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Option<Actor>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let list_query = PostListQuery {
        filter: ListFilter::parse(query.filter.as_deref())?,
        tag: query.tag,
        limit: query.limit,
        offset: query.offset,
    };

    let posts = service(&pool, moderation)
        .list_posts(actor.as_ref(), list_query)
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Get a post with its comment tree
pub async fn get_post(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service(&pool, moderation).get_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Create a new post
pub async fn create_post(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Actor,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let req = req.into_inner();

    let post = service(&pool, moderation)
        .create_post(
            &actor,
            NewPost {
                title: req.title,
                content: req.content,
                tag_ids: req.tag_ids,
                tag_names: req.tag_names,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(post))
}

/// Update a post (owner or admin)
pub async fn update_post(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Actor,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let req = req.into_inner();

    let post = service(&pool, moderation)
        .update_post(
            &actor,
            *post_id,
            PostChanges {
                title: req.title,
                content: req.content,
                tag_ids: req.tag_ids,
                tag_names: req.tag_names,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post (owner or admin)
pub async fn delete_post(
    pool: web::Data<PgPool>,
    moderation: web::Data<ModerationGate>,
    actor: Actor,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&pool, moderation)
        .delete_post(&actor, *post_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
