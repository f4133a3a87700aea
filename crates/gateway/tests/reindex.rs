//! Reconciliation: idempotent bulk repair of the mirror, with and
//! without pruning of stale deletes.

mod common;

use syncline_core::{EntityKind, PageRequest, Post, Privacy};

use common::build_gateway;

#[tokio::test]
async fn reindex_restores_documents_lost_to_an_outage() {
    let ctx = build_gateway().await;

    ctx.post_index.fail_index(true);
    for n in 0..5 {
        ctx.gateway
            .posts
            .save(Post::new(format!("post {n}"), Privacy::Public))
            .await
            .unwrap();
    }
    assert_eq!(ctx.post_index.len(), 0, "mirror missed every write");

    ctx.post_index.fail_index(false);
    let report = ctx.gateway.reindex_all().await.unwrap();

    assert_eq!(ctx.post_index.len(), 5);
    let posts_entry = report
        .entries
        .iter()
        .find(|e| e.kind == EntityKind::Post)
        .unwrap();
    assert_eq!(posts_entry.indexed, 5);
    assert_eq!(posts_entry.failed, 0);
}

#[tokio::test]
async fn reindex_twice_is_idempotent() {
    let ctx = build_gateway().await;

    for n in 0..4 {
        ctx.gateway
            .posts
            .save(Post::new(format!("post {n}"), Privacy::Public))
            .await
            .unwrap();
    }

    ctx.gateway.reindex_all().await.unwrap();
    let mut first_ids = ctx.post_index.ids();
    first_ids.sort_unstable();

    ctx.gateway.reindex_all().await.unwrap();
    let mut second_ids = ctx.post_index.ids();
    second_ids.sort_unstable();

    assert_eq!(first_ids, second_ids);
    assert_eq!(ctx.post_index.len(), 4);

    let hits = ctx
        .gateway
        .posts
        .search("post", &PageRequest::of(0, 10))
        .await
        .unwrap();
    assert_eq!(hits.total, 4);
}

#[tokio::test]
async fn plain_reindex_keeps_stale_deletes_and_pruning_removes_them() {
    let ctx = build_gateway().await;

    let keep = ctx
        .gateway
        .posts
        .save(Post::new("keeper", Privacy::Public))
        .await
        .unwrap();
    let doomed = ctx
        .gateway
        .posts
        .save(Post::new("doomed", Privacy::Public))
        .await
        .unwrap();
    let doomed_id = doomed.id.unwrap();

    // Crash between the delete's two steps: the record row is gone but
    // the document survived.
    ctx.post_index.fail_delete(true);
    ctx.gateway.posts.delete(doomed_id).await.unwrap();
    ctx.post_index.fail_delete(false);
    assert_eq!(ctx.post_index.len(), 2);

    // Upsert-only reconciliation cannot remove it.
    ctx.gateway.reindex_all().await.unwrap();
    assert_eq!(ctx.post_index.len(), 2, "plain reindex only upserts");

    // The pruning variant diffs mirror ids against the export.
    let report = ctx.gateway.reindex_all_pruning().await.unwrap();
    assert_eq!(ctx.post_index.len(), 1);
    assert_eq!(ctx.post_index.ids(), vec![keep.id.unwrap()]);
    assert_eq!(report.total_pruned(), 1);
}

#[tokio::test]
async fn reindex_covers_every_entity_kind() {
    let ctx = build_gateway().await;
    let report = ctx.gateway.reindex_all().await.unwrap();

    let kinds: Vec<EntityKind> = report.entries.iter().map(|e| e.kind).collect();
    for kind in EntityKind::ALL {
        assert!(kinds.contains(&kind), "missing reindex target for {kind}");
    }
}

#[tokio::test]
async fn reindex_partial_failures_are_counted_not_fatal() {
    let ctx = build_gateway().await;

    ctx.gateway
        .posts
        .save(Post::new("will go stale", Privacy::Public))
        .await
        .unwrap();

    ctx.post_index.fail_index(true);
    let report = ctx.gateway.reindex_all().await.unwrap();
    let posts_entry = report
        .entries
        .iter()
        .find(|e| e.kind == EntityKind::Post)
        .unwrap();
    assert_eq!(posts_entry.indexed, 0);
    assert_eq!(posts_entry.failed, 1);
}
