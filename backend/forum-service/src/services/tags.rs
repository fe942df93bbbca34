/// Tag service - case-insensitive tag registry
use crate::db::tag_repo;
use crate::error::{AppError, Result};
use crate::models::Tag;
use sqlx::PgPool;

/// Longest accepted tag name (matches the column width)
pub const MAX_TAG_NAME_LEN: usize = 50;

pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a name to a tag, creating it on first use. The flag is `true`
    /// when the tag was created by this call.
    pub async fn get_or_create(&self, raw_name: &str) -> Result<(Tag, bool)> {
        let name = normalize_tag_name(raw_name)?;
        let (tag, created) = tag_repo::get_or_create_tag(&self.pool, name).await?;

        if created {
            tracing::info!(tag_id = %tag.id, name = %tag.name, "tag created");
        }

        Ok((tag, created))
    }

    /// Up to ten tags whose name contains `query`, any case.
    pub async fn search(&self, query: &str) -> Result<Vec<Tag>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tag_repo::search_tags(&self.pool, query).await?)
    }
}

/// Trim and validate a tag name.
pub fn normalize_tag_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Tag name cannot exceed {} characters",
            MAX_TAG_NAME_LEN
        )));
    }
    Ok(name)
}
