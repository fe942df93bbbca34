use crate::models::Tag;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum rows returned by `search_tags`
pub const SEARCH_LIMIT: i64 = 10;

/// Find a tag by name (any case) or create it. The flag is `true` when this
/// call inserted the row.
pub async fn get_or_create_tag(pool: &PgPool, name: &str) -> Result<(Tag, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name)
        VALUES ($1)
        ON CONFLICT ((lower(name))) DO NOTHING
        RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    if let Some(tag) = inserted {
        return Ok((tag, true));
    }

    let existing = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE lower(name) = lower($1)")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok((existing, false))
}

/// Case-insensitive substring search, ordered by name.
pub async fn search_tags(pool: &PgPool, query: &str) -> Result<Vec<Tag>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(query));

    sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, name
        FROM tags
        WHERE name ILIKE $1 ESCAPE '\'
        ORDER BY lower(name) ASC
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await
}

/// Tags with the given ids; unknown ids are simply absent from the result.
pub async fn find_tags_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

/// Tags for a batch of posts, keyed by post id.
pub async fn tags_for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>, sqlx::Error> {
    let rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
        r#"
        SELECT pt.post_id, t.id, t.name
        FROM post_tags pt
        JOIN tags t ON t.id = pt.tag_id
        WHERE pt.post_id = ANY($1)
        ORDER BY lower(t.name) ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await?;

    let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for (post_id, id, name) in rows {
        by_post.entry(post_id).or_default().push(Tag { id, name });
    }

    Ok(by_post)
}

/// Replace the tag set of a post inside an open transaction.
pub(crate) async fn replace_post_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO post_tags (post_id, tag_id)
        SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS tag_id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
