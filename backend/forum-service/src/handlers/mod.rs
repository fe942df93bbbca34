/// HTTP handlers for forum endpoints
///
/// This module contains handlers for:
/// - Posts: list, read (with comment tree), create, update, delete
/// - Comments: threaded replies with subtree reads and deletes
/// - Votes: toggle-style up/down votes and the caller's current vote
/// - Tags: get-or-create by name and substring search
/// - Health: liveness and readiness probes
///
/// All forum routes live under `/api/v1/forum` behind `JwtAuthMiddleware`.
/// Reads accept anonymous callers; writes require an `Actor`.
pub mod comments;
pub mod health;
pub mod posts;
pub mod tags;
pub mod votes;

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;
use actix_web::web;
use validator::ValidationError;

/// Rejects bodies that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Mount the forum API and the JSON error handlers for extractors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .service(
        web::scope("/api/v1/forum")
            .wrap(JwtAuthMiddleware)
            .service(
                web::resource("/posts/")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource("/posts/{post_id}/")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::update_post))
                    .route(web::delete().to(posts::delete_post)),
            )
            .service(
                web::resource("/comments/")
                    .route(web::get().to(comments::list_comments))
                    .route(web::post().to(comments::create_comment)),
            )
            .service(
                web::resource("/comments/{comment_id}/")
                    .route(web::get().to(comments::get_comment))
                    .route(web::put().to(comments::update_comment))
                    .route(web::delete().to(comments::delete_comment)),
            )
            .service(web::resource("/votes/").route(web::post().to(votes::cast_vote)))
            .service(
                web::resource("/votes/{post_id}/user-vote/")
                    .route(web::get().to(votes::get_user_vote)),
            )
            .service(web::resource("/tags/").route(web::post().to(tags::create_tag)))
            .service(web::resource("/tags/search/").route(web::get().to(tags::search_tags))),
    );
}
