//! Write-path ordering and partial-failure semantics: record store
//! first, mirror second, mirror failures invisible to callers.

mod common;

use syncline_core::{Comment, CommentPatch, EntityId, PageRequest, Post, Privacy};
use syncline_gateway::GatewayError;
use syncline_record::RecordError;

use common::build_gateway;

fn comment(content: &str) -> Comment {
    Comment::new(content, EntityId(1))
}

#[tokio::test]
async fn save_persists_then_indexes() {
    let ctx = build_gateway().await;

    let saved = ctx.gateway.comments.save(comment("hello")).await.unwrap();
    let id = saved.id.unwrap();

    let found = ctx.gateway.comments.find_one(id).await.unwrap();
    assert!(found.is_some(), "record store must hold the row");

    let hits = ctx
        .gateway
        .comments
        .search("hello", &PageRequest::of(0, 10))
        .await
        .unwrap();
    assert_eq!(hits.total, 1, "mirror must hold the document");
}

#[tokio::test]
async fn failed_record_write_leaves_no_index_document() {
    let ctx = build_gateway().await;

    // Updating an id that was never assigned fails at the record store,
    // before step three can run.
    let mut ghost = comment("never persisted");
    ghost.id = Some(EntityId(777));

    let result = ctx.gateway.comments.update(ghost).await;
    assert!(matches!(
        result,
        Err(GatewayError::Record(RecordError::NotFound { .. }))
    ));
    assert_eq!(
        ctx.comment_index.len(),
        0,
        "nothing may reach the mirror when the authoritative write fails"
    );
}

#[tokio::test]
async fn index_outage_does_not_fail_the_write() {
    let ctx = build_gateway().await;
    ctx.comment_index.fail_index(true);

    let saved = ctx.gateway.comments.save(comment("stale")).await.unwrap();
    let id = saved.id.unwrap();

    // The caller saw success; the record store committed.
    assert!(ctx.gateway.comments.find_one(id).await.unwrap().is_some());
    // The mirror is stale.
    assert_eq!(ctx.comment_index.len(), 0);

    // The next write to the same entity repairs it.
    ctx.comment_index.fail_index(false);
    ctx.gateway
        .comments
        .update(ctx.gateway.comments.find_one(id).await.unwrap().unwrap())
        .await
        .unwrap();
    assert_eq!(ctx.comment_index.len(), 1);
}

#[tokio::test]
async fn partial_update_merges_only_populated_fields() {
    let ctx = build_gateway().await;

    let mut original = comment("original");
    original.post_id = Some(EntityId(42));
    let saved = ctx.gateway.comments.save(original).await.unwrap();
    let id = saved.id.unwrap();

    let patched = ctx
        .gateway
        .comments
        .partial_update(
            id,
            CommentPatch {
                content: Some("patched".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("row exists");

    assert_eq!(patched.content, "patched");
    assert_eq!(patched.post_id, Some(EntityId(42)), "untouched field kept");

    // The mirror reflects the patched value.
    let hits = ctx
        .gateway
        .comments
        .search("patched", &PageRequest::of(0, 10))
        .await
        .unwrap();
    assert_eq!(hits.total, 1);
}

#[tokio::test]
async fn partial_update_of_missing_id_is_none() {
    let ctx = build_gateway().await;
    let result = ctx
        .gateway
        .comments
        .partial_update(EntityId(404), CommentPatch::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn update_without_id_is_a_validation_error() {
    let ctx = build_gateway().await;
    let result = ctx.gateway.comments.update(comment("no id")).await;
    assert!(matches!(result, Err(GatewayError::Validation(_))));
}

#[tokio::test]
async fn delete_removes_record_then_document() {
    let ctx = build_gateway().await;

    let saved = ctx.gateway.comments.save(comment("bye")).await.unwrap();
    let id = saved.id.unwrap();

    let existed = ctx.gateway.comments.delete(id).await.unwrap();
    assert!(existed);
    assert!(ctx.gateway.comments.find_one(id).await.unwrap().is_none());
    assert_eq!(ctx.comment_index.len(), 0);
}

#[tokio::test]
async fn failed_delete_propagation_leaves_stale_document() {
    let ctx = build_gateway().await;

    let post = ctx
        .gateway
        .posts
        .save(Post::new("short lived", Privacy::Public))
        .await
        .unwrap();
    let id = post.id.unwrap();
    assert_eq!(ctx.post_index.len(), 1);

    ctx.post_index.fail_delete(true);
    let existed = ctx.gateway.posts.delete(id).await.unwrap();
    assert!(existed, "the record delete still succeeds");

    // Record store no longer returns the id; the mirror still does.
    assert!(ctx.gateway.posts.find_one(id).await.unwrap().is_none());
    assert_eq!(ctx.post_index.len(), 1, "stale document remains");
}

#[tokio::test]
async fn writes_to_different_kinds_are_independent() {
    let ctx = build_gateway().await;

    // A comment mirror outage must not affect post writes.
    ctx.comment_index.fail_index(true);
    ctx.gateway.comments.save(comment("stale")).await.unwrap();
    ctx.gateway
        .posts
        .save(Post::new("unaffected", Privacy::Public))
        .await
        .unwrap();

    assert_eq!(ctx.comment_index.len(), 0);
    assert_eq!(ctx.post_index.len(), 1);
}
