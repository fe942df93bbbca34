/// Database access layer
///
/// This module provides:
/// - Connection pooling (`create_pool`)
/// - Embedded schema migrations (`run_migrations`)
/// - Repositories for posts, tags, comments and votes
///
/// Repositories are free functions over `&PgPool`. They never check
/// authorization or moderation; the service layer does that first.
pub mod comment_repo;
pub mod post_repo;
pub mod tag_repo;
pub mod vote_repo;

use crate::config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "creating PostgreSQL pool"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
