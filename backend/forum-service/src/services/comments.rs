/// Comment service - threaded comments on posts
///
/// Writes run in a fixed order: the actor is already authenticated by the
/// handler, then ownership is checked (update/delete), then the body passes
/// the moderation gate (create/update), and only then does the store change.
use crate::auth::Actor;
use crate::db::comment_repo;
use crate::error::{AppError, Result};
use crate::middleware::permissions::ensure_can_mutate;
use crate::models::{build_forest, tree::build_subtree, Comment, CommentNode};
use crate::services::moderation::ModerationGate;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    pool: PgPool,
    moderation: Arc<ModerationGate>,
}

impl CommentService {
    pub fn new(pool: PgPool, moderation: Arc<ModerationGate>) -> Self {
        Self { pool, moderation }
    }

    /// Top-level comments of a post, each with its full reply tree.
    pub async fn list_top_level(&self, post_id: Uuid) -> Result<Vec<CommentNode>> {
        let rows = comment_repo::list_by_post(&self.pool, post_id).await?;
        Ok(build_forest(rows))
    }

    /// One comment with its replies.
    pub async fn get_comment(&self, comment_id: Uuid) -> Result<CommentNode> {
        let rows = comment_repo::list_subtree(&self.pool, comment_id).await?;
        build_subtree(comment_id, rows).ok_or_else(|| comment_not_found(comment_id))
    }

    pub async fn create_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> Result<Comment> {
        self.moderation.assert_clean(content).await?;

        let comment =
            comment_repo::create_comment(&self.pool, post_id, actor.id, content, parent_id)
                .await?;

        tracing::info!(
            comment_id = %comment.id,
            %post_id,
            user_id = %actor.id,
            depth = comment.depth,
            "comment created"
        );

        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: &Actor,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let existing = self.load(comment_id).await?;
        ensure_can_mutate(actor, &existing)?;

        self.moderation.assert_clean(content).await?;

        comment_repo::update_comment(&self.pool, comment_id, content)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))
    }

    /// Remove a comment and every reply beneath it.
    pub async fn delete_comment(&self, actor: &Actor, comment_id: Uuid) -> Result<()> {
        let existing = self.load(comment_id).await?;
        ensure_can_mutate(actor, &existing)?;

        let removed = comment_repo::delete_subtree(&self.pool, comment_id).await?;
        if removed.is_empty() {
            return Err(comment_not_found(comment_id));
        }

        tracing::info!(
            %comment_id,
            user_id = %actor.id,
            removed = removed.len(),
            "comment subtree deleted"
        );

        Ok(())
    }

    async fn load(&self, comment_id: Uuid) -> Result<Comment> {
        comment_repo::find_comment_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| comment_not_found(comment_id))
    }
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("comment {}", comment_id))
}
