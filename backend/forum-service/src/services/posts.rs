/// Post service - posts with tag sets, vote tallies and comment forests
use crate::auth::Actor;
use crate::db::post_repo::{self, PostListFilter, PostOrdering};
use crate::db::{comment_repo, tag_repo, vote_repo};
use crate::error::{AppError, Result};
use crate::middleware::permissions::ensure_can_mutate;
use crate::models::{build_forest, Post, PostView};
use crate::services::moderation::ModerationGate;
use crate::services::tags::normalize_tag_name;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on tags per post
pub const MAX_TAGS_PER_POST: usize = 3;

/// Default and ceiling for listing page size
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Which posts a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    Recent,
    HighestVoted,
    /// The caller's own posts; requires authentication
    UserPosts,
}

impl ListFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("recent") => Ok(ListFilter::Recent),
            Some("highest_voted") => Ok(ListFilter::HighestVoted),
            Some("user_posts") => Ok(ListFilter::UserPosts),
            Some(other) => Err(AppError::Validation(format!(
                "Unknown filter '{}'. Use recent, highest_voted or user_posts",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostListQuery {
    pub filter: ListFilter,
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tag_ids: Vec<Uuid>,
    pub tag_names: Vec<String>,
}

/// Edit to an existing post. Empty tag lists keep the current set.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: String,
    pub tag_ids: Vec<Uuid>,
    pub tag_names: Vec<String>,
}

pub struct PostService {
    pool: PgPool,
    moderation: Arc<ModerationGate>,
}

impl PostService {
    pub fn new(pool: PgPool, moderation: Arc<ModerationGate>) -> Self {
        Self { pool, moderation }
    }

    pub async fn list_posts(
        &self,
        actor: Option<&Actor>,
        query: PostListQuery,
    ) -> Result<Vec<PostView>> {
        let author_id = match query.filter {
            ListFilter::UserPosts => Some(
                actor
                    .ok_or_else(|| {
                        AppError::Unauthorized("Log in to list your own posts".to_string())
                    })?
                    .id,
            ),
            _ => None,
        };

        let filter = PostListFilter {
            ordering: match query.filter {
                ListFilter::HighestVoted => PostOrdering::HighestVoted,
                ListFilter::Recent | ListFilter::UserPosts => PostOrdering::Recent,
            },
            author_id,
            tag: query
                .tag
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            limit: query
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        };

        let rows = post_repo::list_posts(&self.pool, &filter).await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.post.id).collect();
        let mut tags = tag_repo::tags_for_posts(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| PostView {
                tags: tags.remove(&row.post.id).unwrap_or_default(),
                total_votes: row.total_votes,
                post: row.post,
                comments: None,
            })
            .collect())
    }

    /// A post with its tags, tally and full comment forest.
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        let post = self.load(post_id).await?;
        let comments = comment_repo::list_by_post(&self.pool, post_id).await?;

        let mut view = self.view_of(post).await?;
        view.comments = Some(build_forest(comments));
        Ok(view)
    }

    pub async fn create_post(&self, actor: &Actor, input: NewPost) -> Result<PostView> {
        let title = require_title(&input.title)?;
        precheck_tag_input(&input.tag_ids, &input.tag_names)?;
        if input.tag_ids.is_empty() && input.tag_names.is_empty() {
            return Err(AppError::Validation(
                "A post needs at least one tag".to_string(),
            ));
        }

        self.moderation
            .assert_all_clean(&[title, input.content.as_str()])
            .await?;

        let tag_ids = self.resolve_tags(&input.tag_ids, &input.tag_names).await?;
        check_tag_count(&tag_ids)?;

        let post =
            post_repo::create_post(&self.pool, actor.id, title, &input.content, &tag_ids).await?;

        tracing::info!(
            post_id = %post.id,
            author_id = %actor.id,
            tags = tag_ids.len(),
            "post created"
        );

        self.view_of(post).await
    }

    pub async fn update_post(
        &self,
        actor: &Actor,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Result<PostView> {
        let existing = self.load(post_id).await?;
        ensure_can_mutate(actor, &existing)?;

        let title = changes.title.as_deref().map(require_title).transpose()?;
        let replaces_tags = !changes.tag_ids.is_empty() || !changes.tag_names.is_empty();
        if replaces_tags {
            precheck_tag_input(&changes.tag_ids, &changes.tag_names)?;
        }

        match title {
            Some(title) => {
                self.moderation
                    .assert_all_clean(&[title, changes.content.as_str()])
                    .await?
            }
            None => self.moderation.assert_clean(&changes.content).await?,
        }

        let tag_ids = if replaces_tags {
            let ids = self
                .resolve_tags(&changes.tag_ids, &changes.tag_names)
                .await?;
            check_tag_count(&ids)?;
            Some(ids)
        } else {
            None
        };

        let post = post_repo::update_post(
            &self.pool,
            post_id,
            title,
            &changes.content,
            tag_ids.as_deref(),
        )
        .await?
        .ok_or_else(|| post_not_found(post_id))?;

        tracing::info!(%post_id, user_id = %actor.id, "post updated");

        self.view_of(post).await
    }

    pub async fn delete_post(&self, actor: &Actor, post_id: Uuid) -> Result<()> {
        let existing = self.load(post_id).await?;
        ensure_can_mutate(actor, &existing)?;

        if !post_repo::delete_post(&self.pool, post_id).await? {
            return Err(post_not_found(post_id));
        }

        tracing::info!(%post_id, user_id = %actor.id, "post deleted");
        Ok(())
    }

    async fn load(&self, post_id: Uuid) -> Result<Post> {
        post_repo::find_post_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))
    }

    async fn view_of(&self, post: Post) -> Result<PostView> {
        let total_votes = vote_repo::tally(&self.pool, post.id).await?;
        let tags = tag_repo::tags_for_posts(&self.pool, &[post.id])
            .await?
            .remove(&post.id)
            .unwrap_or_default();

        Ok(PostView {
            post,
            tags,
            total_votes,
            comments: None,
        })
    }

    /// Union of explicit ids and named tags (created on demand), first
    /// occurrence order, no duplicates.
    async fn resolve_tags(&self, tag_ids: &[Uuid], tag_names: &[String]) -> Result<Vec<Uuid>> {
        let mut resolved = dedup(tag_ids.iter().copied());

        if !resolved.is_empty() {
            let found = tag_repo::find_tags_by_ids(&self.pool, &resolved).await?;
            if found.len() != resolved.len() {
                let known: HashSet<Uuid> = found.iter().map(|t| t.id).collect();
                let missing: Vec<String> = resolved
                    .iter()
                    .filter(|id| !known.contains(*id))
                    .map(Uuid::to_string)
                    .collect();
                return Err(AppError::Validation(format!(
                    "Unknown tag id(s): {}",
                    missing.join(", ")
                )));
            }
        }

        for raw in tag_names {
            let name = normalize_tag_name(raw)?;
            let (tag, _) = tag_repo::get_or_create_tag(&self.pool, name).await?;
            if !resolved.contains(&tag.id) {
                resolved.push(tag.id);
            }
        }

        Ok(resolved)
    }
}

fn post_not_found(post_id: Uuid) -> AppError {
    AppError::NotFound(format!("post {}", post_id))
}

fn require_title(raw: &str) -> Result<&str> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title cannot be empty".to_string()));
    }
    if title.chars().count() > 200 {
        return Err(AppError::Validation(
            "Title cannot exceed 200 characters".to_string(),
        ));
    }
    Ok(title)
}

/// Reject inputs that cannot possibly fit before any tag gets created.
fn precheck_tag_input(tag_ids: &[Uuid], tag_names: &[String]) -> Result<()> {
    let distinct_ids = dedup(tag_ids.iter().copied()).len();
    let distinct_names = dedup(
        tag_names
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty()),
    )
    .len();

    if distinct_ids > MAX_TAGS_PER_POST || distinct_names > MAX_TAGS_PER_POST {
        return Err(too_many_tags());
    }
    Ok(())
}

fn check_tag_count(tag_ids: &[Uuid]) -> Result<()> {
    match tag_ids.len() {
        0 => Err(AppError::Validation(
            "A post needs at least one tag".to_string(),
        )),
        n if n > MAX_TAGS_PER_POST => Err(too_many_tags()),
        _ => Ok(()),
    }
}

fn too_many_tags() -> AppError {
    AppError::Validation(format!(
        "A post can have at most {} tags",
        MAX_TAGS_PER_POST
    ))
}

fn dedup<T: Eq + std::hash::Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
