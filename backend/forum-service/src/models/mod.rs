/// Data models for forum-service
///
/// This module defines structures for:
/// - Post: Top-level forum submission carrying a tag set and a vote tally
/// - Tag: Case-insensitively unique label attached to posts
/// - Comment: Threaded reply on a post (see `tree` for the forest view)
/// - VoteValue / VoteAction: Signed vote direction and toggle transitions
pub mod tree;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use tree::{build_forest, CommentNode};

/// Post row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tag row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Comment row. `depth` is materialized at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
    pub content: String,
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post as returned by the API: row plus tags, tally and (on detail reads)
/// the comment forest.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
    pub total_votes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentNode>>,
}

/// A vote direction. Zero is never a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(VoteValue::Up),
            -1 => Some(VoteValue::Down),
            _ => None,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(other),
        }
    }
}

/// What a cast did to the (user, post) slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Updated,
    Removed,
}

impl VoteAction {
    /// Transition for a cast against the slot's current value.
    pub fn resolve(existing: Option<VoteValue>, cast: VoteValue) -> Self {
        match existing {
            None => VoteAction::Created,
            Some(current) if current == cast => VoteAction::Removed,
            Some(_) => VoteAction::Updated,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            VoteAction::Created => "Vote recorded.",
            VoteAction::Updated => "Vote updated.",
            VoteAction::Removed => "Vote removed.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteAction::Created => "created",
            VoteAction::Updated => "updated",
            VoteAction::Removed => "removed",
        }
    }
}

/// Result of `cast_vote`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub action: VoteAction,
    pub total_votes: i64,
    /// Signed value now held by the caller, 0 when removed
    pub user_vote: i16,
}
