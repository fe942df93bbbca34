//! In-memory assembly of comment forests.
//!
//! Comments are loaded for a whole post in one query and kept in an arena
//! (`Vec<Comment>`); a `parent -> children` index over arena slots is then
//! used to build nested `CommentNode`s. Nothing here holds back-references.

use super::Comment;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A comment with its full reply subtree, children in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including the root.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.replies.iter());
        }
        count
    }
}

// Long reply chains would otherwise be freed one nested call per level.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// A node whose children are still being assembled.
struct Frame {
    comment: Comment,
    pending: std::vec::IntoIter<usize>,
    replies: Vec<CommentNode>,
}

struct Arena {
    slots: Vec<Option<Comment>>,
    children: HashMap<Uuid, Vec<usize>>,
}

impl Arena {
    fn new(mut comments: Vec<Comment>) -> Self {
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut children: HashMap<Uuid, Vec<usize>> = HashMap::new();
        for (idx, comment) in comments.iter().enumerate() {
            if let Some(parent_id) = comment.parent_id {
                children.entry(parent_id).or_default().push(idx);
            }
        }

        Self {
            slots: comments.into_iter().map(Some).collect(),
            children,
        }
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().map(|c| c.id) == Some(id))
    }

    fn open(&mut self, idx: usize) -> Option<Frame> {
        let comment = self.slots.get_mut(idx)?.take()?;
        let pending = self
            .children
            .remove(&comment.id)
            .unwrap_or_default()
            .into_iter();

        Some(Frame {
            comment,
            pending,
            replies: Vec::new(),
        })
    }

    /// Assemble the subtree at `idx` with an explicit stack, so the nesting
    /// depth of a thread never turns into call depth.
    fn take_node(&mut self, idx: usize) -> Option<CommentNode> {
        let mut stack = vec![self.open(idx)?];

        loop {
            let next_child = stack.last_mut()?.pending.next();
            if let Some(child) = next_child {
                if let Some(frame) = self.open(child) {
                    stack.push(frame);
                }
                continue;
            }

            let done = stack.pop()?;
            let node = CommentNode {
                comment: done.comment,
                replies: done.replies,
            };
            match stack.last_mut() {
                Some(parent) => parent.replies.push(node),
                None => return Some(node),
            }
        }
    }
}

/// Build the forest of a post: top-level comments in creation order, each
/// with its replies nested depth-first. Rows whose parent is not part of the
/// input are skipped.
pub fn build_forest(comments: Vec<Comment>) -> Vec<CommentNode> {
    let mut arena = Arena::new(comments);

    let roots: Vec<usize> = arena
        .slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.as_ref().map(|c| c.parent_id.is_none()) == Some(true))
        .map(|(idx, _)| idx)
        .collect();

    roots
        .into_iter()
        .filter_map(|idx| arena.take_node(idx))
        .collect()
}

/// Build the subtree rooted at `root_id` from a set of rows that contains it.
pub fn build_subtree(root_id: Uuid, comments: Vec<Comment>) -> Option<CommentNode> {
    let mut arena = Arena::new(comments);
    let idx = arena.position(root_id)?;
    arena.take_node(idx)
}
