//! Integration Tests: comment tree store, vote ledger and tag registry
//!
//! Coverage:
//! - Depth and same-post invariants on comment insert
//! - Forest ordering and atomic subtree deletion
//! - Vote toggle sequence, flips, tallies and concurrent casts
//! - Case-insensitive tag reuse and post cascade deletes
//!
//! Architecture:
//! - Uses testcontainers for PostgreSQL database
//! - Calls repositories and services directly
//!
//! Run manually (requires Docker): cargo test --test forum_store_test -- --ignored

mod common;

use common::{seed_post, setup_test_db, unreachable_gate, vote_rows};
use forum_service::auth::Actor;
use forum_service::db::comment_repo::{self, TreeError, MAX_COMMENT_DEPTH};
use forum_service::db::{post_repo, tag_repo, vote_repo};
use forum_service::error::AppError;
use forum_service::models::{VoteAction, VoteValue};
use forum_service::services::{CommentService, VoteService};
use std::sync::Arc;
use uuid::Uuid;

fn actor(id: Uuid) -> Actor {
    Actor {
        id,
        is_admin: false,
    }
}

#[tokio::test]
#[ignore]
async fn comment_depth_follows_parent_and_stays_on_post() {
    let pool = setup_test_db().await.expect("db");
    let author = Uuid::new_v4();
    let post_a = seed_post(&pool, author).await;
    let post_b = seed_post(&pool, author).await;

    let root = comment_repo::create_comment(&pool, post_a, author, "root", None)
        .await
        .unwrap();
    let child = comment_repo::create_comment(&pool, post_a, author, "child", Some(root.id))
        .await
        .unwrap();
    let grandchild =
        comment_repo::create_comment(&pool, post_a, author, "grandchild", Some(child.id))
            .await
            .unwrap();

    assert_eq!(root.depth, 0);
    assert_eq!(child.depth, 1);
    assert_eq!(grandchild.depth, 2);
    assert_eq!(grandchild.parent_id, Some(child.id));

    let cross = comment_repo::create_comment(&pool, post_b, author, "cross", Some(root.id)).await;
    assert!(matches!(cross, Err(TreeError::ParentOnDifferentPost { .. })));

    let orphan =
        comment_repo::create_comment(&pool, post_a, author, "orphan", Some(Uuid::new_v4())).await;
    assert!(matches!(orphan, Err(TreeError::NoSuchParent(_))));

    let nowhere =
        comment_repo::create_comment(&pool, Uuid::new_v4(), author, "nowhere", None).await;
    assert!(matches!(nowhere, Err(TreeError::NoSuchPost(_))));
}

#[tokio::test]
#[ignore]
async fn replies_stop_at_max_depth() {
    let pool = setup_test_db().await.expect("db");
    let author = Uuid::new_v4();
    let post = seed_post(&pool, author).await;

    let mut deepest = comment_repo::create_comment(&pool, post, author, "level 0", None)
        .await
        .unwrap();
    for level in 1..=MAX_COMMENT_DEPTH {
        deepest = comment_repo::create_comment(
            &pool,
            post,
            author,
            &format!("level {}", level),
            Some(deepest.id),
        )
        .await
        .unwrap();
    }
    assert_eq!(deepest.depth, MAX_COMMENT_DEPTH);

    let too_deep =
        comment_repo::create_comment(&pool, post, author, "one more", Some(deepest.id)).await;
    assert!(matches!(
        too_deep,
        Err(TreeError::TooDeep { parent_id }) if parent_id == deepest.id
    ));

    let service = CommentService::new(pool.clone(), Arc::new(unreachable_gate()));
    let forest = service.list_top_level(post).await.unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].size(), (MAX_COMMENT_DEPTH + 1) as usize);
}

#[tokio::test]
#[ignore]
async fn forest_lists_roots_with_nested_replies_in_creation_order() {
    let pool = setup_test_db().await.expect("db");
    let user = Uuid::new_v4();
    let post = seed_post(&pool, user).await;

    let first = comment_repo::create_comment(&pool, post, user, "first", None)
        .await
        .unwrap();
    let second = comment_repo::create_comment(&pool, post, user, "second", None)
        .await
        .unwrap();
    let reply_a = comment_repo::create_comment(&pool, post, user, "reply a", Some(first.id))
        .await
        .unwrap();
    let reply_b = comment_repo::create_comment(&pool, post, user, "reply b", Some(first.id))
        .await
        .unwrap();
    let nested = comment_repo::create_comment(&pool, post, user, "nested", Some(reply_a.id))
        .await
        .unwrap();

    let service = CommentService::new(pool.clone(), Arc::new(unreachable_gate()));
    let forest = service.list_top_level(post).await.unwrap();

    let roots: Vec<Uuid> = forest.iter().map(|n| n.comment.id).collect();
    assert_eq!(roots, vec![first.id, second.id]);

    let replies: Vec<Uuid> = forest[0].replies.iter().map(|n| n.comment.id).collect();
    assert_eq!(replies, vec![reply_a.id, reply_b.id]);
    assert_eq!(forest[0].replies[0].replies[0].comment.id, nested.id);
    assert!(forest[1].replies.is_empty());

    let single = service.get_comment(reply_a.id).await.unwrap();
    assert_eq!(single.comment.id, reply_a.id);
    assert_eq!(single.replies.len(), 1);
}

#[tokio::test]
#[ignore]
async fn deleting_a_comment_removes_its_whole_subtree() {
    let pool = setup_test_db().await.expect("db");
    let owner = Uuid::new_v4();
    let post = seed_post(&pool, owner).await;

    let root = comment_repo::create_comment(&pool, post, owner, "root", None)
        .await
        .unwrap();
    let child_1 = comment_repo::create_comment(&pool, post, owner, "c1", Some(root.id))
        .await
        .unwrap();
    let child_2 = comment_repo::create_comment(&pool, post, owner, "c2", Some(root.id))
        .await
        .unwrap();
    let grandchild = comment_repo::create_comment(&pool, post, owner, "g", Some(child_1.id))
        .await
        .unwrap();
    let sibling = comment_repo::create_comment(&pool, post, owner, "sibling", None)
        .await
        .unwrap();

    let service = CommentService::new(pool.clone(), Arc::new(unreachable_gate()));

    let stranger = service
        .delete_comment(&actor(Uuid::new_v4()), root.id)
        .await;
    assert!(matches!(stranger, Err(AppError::Forbidden(_))));

    service.delete_comment(&actor(owner), root.id).await.unwrap();

    for id in [root.id, child_1.id, child_2.id, grandchild.id] {
        assert!(comment_repo::find_comment_by_id(&pool, id)
            .await
            .unwrap()
            .is_none());
    }
    assert!(comment_repo::find_comment_by_id(&pool, sibling.id)
        .await
        .unwrap()
        .is_some());

    let again = service.delete_comment(&actor(owner), root.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn same_value_toggles_the_vote_off_and_on() {
    let pool = setup_test_db().await.expect("db");
    let post = seed_post(&pool, Uuid::new_v4()).await;
    let voter = Uuid::new_v4();

    let first = vote_repo::cast_vote(&pool, post, voter, VoteValue::Up)
        .await
        .unwrap();
    assert_eq!(first.action, VoteAction::Created);
    assert_eq!((first.total_votes, first.user_vote), (1, 1));

    let second = vote_repo::cast_vote(&pool, post, voter, VoteValue::Up)
        .await
        .unwrap();
    assert_eq!(second.action, VoteAction::Removed);
    assert_eq!((second.total_votes, second.user_vote), (0, 0));
    assert_eq!(vote_rows(&pool, post, voter).await, 0);

    let third = vote_repo::cast_vote(&pool, post, voter, VoteValue::Up)
        .await
        .unwrap();
    assert_eq!(third.action, VoteAction::Created);
    assert_eq!((third.total_votes, third.user_vote), (1, 1));
}

#[tokio::test]
#[ignore]
async fn opposite_value_flips_the_vote_in_place() {
    let pool = setup_test_db().await.expect("db");
    let post = seed_post(&pool, Uuid::new_v4()).await;
    let voter = Uuid::new_v4();

    vote_repo::cast_vote(&pool, post, voter, VoteValue::Up)
        .await
        .unwrap();
    let flipped = vote_repo::cast_vote(&pool, post, voter, VoteValue::Down)
        .await
        .unwrap();

    assert_eq!(flipped.action, VoteAction::Updated);
    assert_eq!(flipped.total_votes, -1);
    assert_eq!(flipped.user_vote, -1);
    assert_eq!(vote_rows(&pool, post, voter).await, 1);
    assert_eq!(vote_repo::get_user_vote(&pool, post, voter).await.unwrap(), -1);
}

#[tokio::test]
#[ignore]
async fn tally_is_upvotes_minus_downvotes() {
    let pool = setup_test_db().await.expect("db");
    let post = seed_post(&pool, Uuid::new_v4()).await;

    for _ in 0..5 {
        vote_repo::cast_vote(&pool, post, Uuid::new_v4(), VoteValue::Up)
            .await
            .unwrap();
    }
    let mut last = None;
    for _ in 0..2 {
        last = Some(
            vote_repo::cast_vote(&pool, post, Uuid::new_v4(), VoteValue::Down)
                .await
                .unwrap(),
        );
    }

    assert_eq!(last.unwrap().total_votes, 3);
    assert_eq!(vote_repo::tally(&pool, post).await.unwrap(), 3);
    assert_eq!(
        vote_repo::get_user_vote(&pool, post, Uuid::new_v4()).await.unwrap(),
        0
    );
}

#[tokio::test]
#[ignore]
async fn concurrent_casts_leave_at_most_one_row() {
    let pool = setup_test_db().await.expect("db");
    let post = seed_post(&pool, Uuid::new_v4()).await;
    let voter = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            vote_repo::cast_vote(&pool, post, voter, VoteValue::Up).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("cast should succeed");
    }

    let rows = vote_rows(&pool, post, voter).await;
    assert!(rows <= 1, "found {} vote rows for one user", rows);

    let user_vote = vote_repo::get_user_vote(&pool, post, voter).await.unwrap();
    assert_eq!(vote_repo::tally(&pool, post).await.unwrap(), i64::from(user_vote));
}

#[tokio::test]
#[ignore]
async fn vote_service_rejects_bad_values_and_unknown_posts() {
    let pool = setup_test_db().await.expect("db");
    let post = seed_post(&pool, Uuid::new_v4()).await;
    let service = VoteService::new(pool.clone());
    let voter = actor(Uuid::new_v4());

    assert!(matches!(
        service.cast(&voter, post, 0).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        service.cast(&voter, Uuid::new_v4(), 1).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(vote_rows(&pool, post, voter.id).await, 0);
}

#[tokio::test]
#[ignore]
async fn tag_names_are_unique_regardless_of_case() {
    let pool = setup_test_db().await.expect("db");

    let (django, created) = tag_repo::get_or_create_tag(&pool, "Django").await.unwrap();
    assert!(created);

    let (again, created_again) = tag_repo::get_or_create_tag(&pool, "django").await.unwrap();
    assert!(!created_again);
    assert_eq!(again.id, django.id);
    assert_eq!(again.name, "Django");

    tag_repo::get_or_create_tag(&pool, "Rust").await.unwrap();
    let hits = tag_repo::search_tags(&pool, "JAN").await.unwrap();
    assert_eq!(hits, vec![django]);
}

#[tokio::test]
#[ignore]
async fn deleting_a_post_cascades_to_comments_and_votes() {
    let pool = setup_test_db().await.expect("db");
    let author = Uuid::new_v4();
    let post = seed_post(&pool, author).await;

    let comment = comment_repo::create_comment(&pool, post, author, "bye", None)
        .await
        .unwrap();
    vote_repo::cast_vote(&pool, post, author, VoteValue::Up)
        .await
        .unwrap();

    assert!(post_repo::delete_post(&pool, post).await.unwrap());

    assert!(comment_repo::find_comment_by_id(&pool, comment.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(vote_rows(&pool, post, author).await, 0);
}
