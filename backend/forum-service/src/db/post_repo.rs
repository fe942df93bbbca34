use crate::db::tag_repo;
use crate::models::Post;
use sqlx::PgPool;
use uuid::Uuid;

/// Sort order for post listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    /// Newest first
    #[default]
    Recent,
    /// Highest tally first, newest first among equals
    HighestVoted,
}

impl PostOrdering {
    fn order_by(self) -> &'static str {
        match self {
            PostOrdering::Recent => "p.created_at DESC, p.id DESC",
            PostOrdering::HighestVoted => "total_votes DESC, p.created_at DESC, p.id DESC",
        }
    }
}

/// Filters for `list_posts`
#[derive(Debug, Clone, Default)]
pub struct PostListFilter {
    pub ordering: PostOrdering,
    pub author_id: Option<Uuid>,
    /// Tag name, matched case-insensitively
    pub tag: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Post row joined with its vote tally
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithTally {
    #[sqlx(flatten)]
    pub post: Post,
    pub total_votes: i64,
}

/// Insert a post and attach its tags atomically.
pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    content: &str,
    tag_ids: &[Uuid],
) -> Result<Post, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (author_id, title, content)
        VALUES ($1, $2, $3)
        RETURNING id, author_id, title, content, created_at, updated_at
        "#,
    )
    .bind(author_id)
    .bind(title)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    tag_repo::replace_post_tags(&mut tx, post.id, tag_ids).await?;

    tx.commit().await?;

    Ok(post)
}

/// Find a post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, author_id, title, content, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// List posts with their tallies.
pub async fn list_posts(
    pool: &PgPool,
    filter: &PostListFilter,
) -> Result<Vec<PostWithTally>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at,
               COALESCE(v.total, 0)::BIGINT AS total_votes
        FROM posts p
        LEFT JOIN (
            SELECT post_id,
                   COUNT(*) FILTER (WHERE value = 1) - COUNT(*) FILTER (WHERE value = -1) AS total
            FROM votes
            GROUP BY post_id
        ) v ON v.post_id = p.id
        WHERE ($1::uuid IS NULL OR p.author_id = $1)
          AND ($2::text IS NULL OR EXISTS (
                SELECT 1
                FROM post_tags pt
                JOIN tags t ON t.id = pt.tag_id
                WHERE pt.post_id = p.id AND lower(t.name) = lower($2)
          ))
        ORDER BY {}
        LIMIT $3 OFFSET $4
        "#,
        filter.ordering.order_by()
    );

    sqlx::query_as::<_, PostWithTally>(&sql)
        .bind(filter.author_id)
        .bind(filter.tag.as_deref())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await
}

/// Apply an edit. `title: None` keeps the current title; `tag_ids: None`
/// keeps the current tag set. Returns `None` if the post is gone.
pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    title: Option<&str>,
    content: &str,
    tag_ids: Option<&[Uuid]>,
) -> Result<Option<Post>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = COALESCE($2, title), content = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, author_id, title, content, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(title)
    .bind(content)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(post) = post else {
        return Ok(None);
    };

    if let Some(tag_ids) = tag_ids {
        tag_repo::replace_post_tags(&mut tx, post_id, tag_ids).await?;
    }

    tx.commit().await?;

    Ok(Some(post))
}

/// Delete a post; comments, votes and tag links cascade.
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
