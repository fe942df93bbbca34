/// Vote service - one signed vote per (user, post) with toggle semantics
use crate::auth::Actor;
use crate::db::vote_repo;
use crate::error::{AppError, Result};
use crate::metrics::VOTE_ACTIONS_TOTAL;
use crate::models::{VoteOutcome, VoteValue};
use sqlx::PgPool;
use uuid::Uuid;

pub struct VoteService {
    pool: PgPool,
}

impl VoteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cast `raw_value` (+1 or -1) on a post.
    ///
    /// First cast creates the vote, the opposite value flips it, the same
    /// value removes it.
    pub async fn cast(&self, actor: &Actor, post_id: Uuid, raw_value: i64) -> Result<VoteOutcome> {
        let value = parse_vote_value(raw_value)?;

        let outcome = vote_repo::cast_vote(&self.pool, post_id, actor.id, value).await?;

        VOTE_ACTIONS_TOTAL
            .with_label_values(&[outcome.action.as_str()])
            .inc();
        tracing::info!(
            %post_id,
            user_id = %actor.id,
            action = outcome.action.as_str(),
            total_votes = outcome.total_votes,
            "vote cast"
        );

        Ok(outcome)
    }

    /// The actor's current vote on a post, 0 if none.
    pub async fn user_vote(&self, actor: &Actor, post_id: Uuid) -> Result<i16> {
        Ok(vote_repo::get_user_vote(&self.pool, post_id, actor.id).await?)
    }
}

pub fn parse_vote_value(raw: i64) -> Result<VoteValue> {
    VoteValue::try_from(raw).map_err(|other| {
        AppError::Validation(format!("Vote value must be 1 or -1, got {}", other))
    })
}
