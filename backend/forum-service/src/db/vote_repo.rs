use crate::models::{VoteAction, VoteOutcome, VoteValue};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

/// How many times a cast re-attempts the insert after the row it meant to
/// toggle was removed by a concurrent request.
const MAX_CAST_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum VoteLedgerError {
    #[error("post {0} does not exist")]
    NoSuchPost(Uuid),

    #[error("vote slot kept changing under concurrent casts")]
    Contention,

    #[error("stored vote value {0} is out of range")]
    CorruptValue(i16),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Apply one cast for `(user_id, post_id)` and return the new tally.
///
/// Runs in a single transaction: insert-if-absent, otherwise lock the
/// existing row and flip or remove it.
pub async fn cast_vote(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    value: VoteValue,
) -> Result<VoteOutcome, VoteLedgerError> {
    let mut tx = pool.begin().await?;

    let post_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1 FOR SHARE")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
    if !post_exists {
        return Err(VoteLedgerError::NoSuchPost(post_id));
    }

    let mut applied = None;
    for attempt in 1..=MAX_CAST_ATTEMPTS {
        if let Some(action) = try_cast(&mut tx, post_id, user_id, value).await? {
            applied = Some(action);
            break;
        }
        tracing::debug!(%post_id, %user_id, attempt, "vote row vanished, retrying insert");
    }
    let action = applied.ok_or(VoteLedgerError::Contention)?;

    let total_votes = tally_in(&mut tx, post_id).await?;
    tx.commit().await?;

    let user_vote = match action {
        VoteAction::Removed => 0,
        VoteAction::Created | VoteAction::Updated => value.as_i16(),
    };

    Ok(VoteOutcome {
        action,
        total_votes,
        user_vote,
    })
}

/// One insert-or-toggle step. `None` means the conflicting row disappeared
/// between the insert and the lock.
async fn try_cast(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    user_id: Uuid,
    value: VoteValue,
) -> Result<Option<VoteAction>, VoteLedgerError> {
    let inserted = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO votes (user_id, post_id, value)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, post_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .bind(value.as_i16())
    .fetch_optional(&mut **tx)
    .await?;

    if inserted.is_some() {
        return Ok(Some(VoteAction::Created));
    }

    let existing = sqlx::query_scalar::<_, i16>(
        "SELECT value FROM votes WHERE user_id = $1 AND post_id = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(raw) = existing else {
        return Ok(None);
    };
    let current = VoteValue::from_i16(raw).ok_or(VoteLedgerError::CorruptValue(raw))?;

    let action = VoteAction::resolve(Some(current), value);
    match action {
        VoteAction::Removed => {
            sqlx::query("DELETE FROM votes WHERE user_id = $1 AND post_id = $2")
                .bind(user_id)
                .bind(post_id)
                .execute(&mut **tx)
                .await?;
        }
        VoteAction::Updated => {
            sqlx::query(
                r#"
                UPDATE votes
                SET value = $3, updated_at = NOW()
                WHERE user_id = $1 AND post_id = $2
                "#,
            )
            .bind(user_id)
            .bind(post_id)
            .bind(value.as_i16())
            .execute(&mut **tx)
            .await?;
        }
        VoteAction::Created => {}
    }

    Ok(Some(action))
}

const TALLY_SQL: &str = r#"
    SELECT COUNT(*) FILTER (WHERE value = 1) - COUNT(*) FILTER (WHERE value = -1)
    FROM votes
    WHERE post_id = $1
"#;

async fn tally_in(tx: &mut Transaction<'_, Postgres>, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(TALLY_SQL)
        .bind(post_id)
        .fetch_one(&mut **tx)
        .await
}

/// Upvotes minus downvotes for a post.
pub async fn tally(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(TALLY_SQL)
        .bind(post_id)
        .fetch_one(pool)
        .await
}

/// The caller's current value on a post, 0 when they have not voted.
pub async fn get_user_vote(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<i16, sqlx::Error> {
    let value = sqlx::query_scalar::<_, i16>(
        "SELECT value FROM votes WHERE user_id = $1 AND post_id = $2",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(value.unwrap_or(0))
}
