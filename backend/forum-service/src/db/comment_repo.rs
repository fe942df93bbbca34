use crate::models::Comment;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Structural failures when attaching a comment to the tree.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("post {0} does not exist")]
    NoSuchPost(Uuid),

    #[error("parent comment {0} does not exist")]
    NoSuchParent(Uuid),

    #[error("parent comment {parent_id} belongs to a different post")]
    ParentOnDifferentPost { parent_id: Uuid },

    #[error("replies cannot be nested deeper than {} levels", MAX_COMMENT_DEPTH)]
    TooDeep { parent_id: Uuid },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Deepest allowed reply; top-level comments sit at depth 0.
pub const MAX_COMMENT_DEPTH: i32 = 32;

const COMMENT_COLUMNS: &str =
    "id, post_id, parent_id, user_id, content, depth, created_at, updated_at";

/// Insert a comment, deriving its depth from the parent.
///
/// The post and parent rows are share-locked for the duration of the
/// transaction so neither can be deleted before the child lands.
pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> Result<Comment, TreeError> {
    let mut tx = pool.begin().await?;

    let post_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1 FOR SHARE")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
    if !post_exists {
        return Err(TreeError::NoSuchPost(post_id));
    }

    let depth = match parent_id {
        None => 0,
        Some(parent_id) => {
            let parent: Option<(Uuid, i32)> =
                sqlx::query_as("SELECT post_id, depth FROM comments WHERE id = $1 FOR SHARE")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match parent {
                None => return Err(TreeError::NoSuchParent(parent_id)),
                Some((parent_post, _)) if parent_post != post_id => {
                    return Err(TreeError::ParentOnDifferentPost { parent_id })
                }
                Some((_, parent_depth)) if parent_depth >= MAX_COMMENT_DEPTH => {
                    return Err(TreeError::TooDeep { parent_id })
                }
                Some((_, parent_depth)) => parent_depth + 1,
            }
        }
    };

    let comment = sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments (post_id, parent_id, user_id, content, depth)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(parent_id)
    .bind(user_id)
    .bind(content)
    .bind(depth)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(comment)
}

/// Every comment on a post in creation order, for building the forest in one
/// pass.
pub async fn list_by_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE post_id = $1
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// Get a single comment by ID
pub async fn find_comment_by_id(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// A comment and all of its descendants. Empty when the root is missing.
pub async fn list_subtree(pool: &PgPool, root_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        WITH RECURSIVE subtree AS (
            SELECT id FROM comments WHERE id = $1
            UNION ALL
            SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
        )
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE id IN (SELECT id FROM subtree)
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(root_id)
    .fetch_all(pool)
    .await
}

/// Replace the body of a comment. Returns `None` if it no longer exists.
pub async fn update_comment(
    pool: &PgPool,
    comment_id: Uuid,
    content: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        UPDATE comments
        SET content = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(content)
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Delete a comment together with its whole subtree. Returns the ids removed
/// (empty if the comment was already gone).
pub async fn delete_subtree(pool: &PgPool, comment_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query_scalar::<_, Uuid>(
        r#"
        WITH RECURSIVE subtree AS (
            SELECT id FROM comments WHERE id = $1
            UNION ALL
            SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
        )
        DELETE FROM comments
        WHERE id IN (SELECT id FROM subtree)
        RETURNING id
        "#,
    )
    .bind(comment_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(removed)
}
