//! The post attachment path: blob store, ledger, file records.

mod common;

use bytes::Bytes;

use syncline_core::{EntityId, PageRequest, Post, Privacy};
use syncline_gateway::{GatewayError, Upload};

use common::build_gateway;

fn png(name: &str) -> Upload {
    Upload::new(name, Bytes::from_static(b"\x89PNG fake bytes")).with_content_type("image/png")
}

#[tokio::test]
async fn two_uploads_attach_and_return_file_records() {
    let ctx = build_gateway().await;

    let post = ctx
        .gateway
        .posts
        .save(Post::new("holiday photos", Privacy::Public))
        .await
        .unwrap();
    let post_id = post.id.unwrap();
    assert_eq!(post.num_files, 0);

    let records = ctx
        .gateway
        .posts
        .store_files_for_post(
            post_id,
            vec![
                png("a.png"),
                Upload::new("b.txt", Bytes::from_static(b"notes")).with_content_type("text/plain"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0].file_name.ends_with(".png"));
    assert!(records[1].file_name.ends_with(".txt"));
    assert!(records[0].file_url.starts_with("/api/files/download/"));
    assert_eq!(records[1].mime_type, "text/plain");
    assert_eq!(records[1].file_size, 5);
    assert!(records.iter().all(|r| r.id.is_some()));
    assert!(records.iter().all(|r| r.post_id == Some(post_id)));

    // The reloaded post shows the ledger state.
    let reloaded = ctx.gateway.posts.find_one(post_id).await.unwrap().unwrap();
    assert_eq!(reloaded.num_files, 2);
    assert_eq!(reloaded.files.len(), 2);
    assert!(reloaded.files[0].ends_with(".png"));
    assert!(reloaded.files[1].ends_with(".txt"));

    // File records went through the synchronized write, so they are
    // searchable too.
    let hits = ctx
        .gateway
        .files
        .search("mime_type:png", &PageRequest::of(0, 10))
        .await
        .unwrap();
    assert_eq!(hits.total, 1);

    // And the blobs themselves are downloadable.
    let bytes = ctx
        .gateway
        .posts
        .load_file(&reloaded.files[1])
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"notes");
}

#[tokio::test]
async fn attachment_count_tracks_list_across_calls() {
    let ctx = build_gateway().await;

    let post = ctx
        .gateway
        .posts
        .save(Post::new("growing album", Privacy::Friends))
        .await
        .unwrap();
    let post_id = post.id.unwrap();

    for round in 1..=3 {
        ctx.gateway
            .posts
            .store_files_for_post(post_id, vec![png("photo.png")])
            .await
            .unwrap();

        let reloaded = ctx.gateway.posts.find_one(post_id).await.unwrap().unwrap();
        assert_eq!(reloaded.num_files as usize, reloaded.files.len());
        assert_eq!(reloaded.num_files, round);
    }
}

#[tokio::test]
async fn empty_upload_aborts_before_any_mutation() {
    let ctx = build_gateway().await;

    let post = ctx
        .gateway
        .posts
        .save(Post::new("nothing attached", Privacy::Public))
        .await
        .unwrap();
    let post_id = post.id.unwrap();

    let result = ctx
        .gateway
        .posts
        .store_files_for_post(
            post_id,
            vec![png("ok.png"), Upload::new("empty.bin", Bytes::new())],
        )
        .await;
    assert!(matches!(result, Err(GatewayError::Blob(_))));

    // Neither the ledger nor the file records moved.
    let reloaded = ctx.gateway.posts.find_one(post_id).await.unwrap().unwrap();
    assert_eq!(reloaded.num_files, 0);
    assert!(reloaded.files.is_empty());
    assert_eq!(ctx.file_index.len(), 0);
}

#[tokio::test]
async fn storing_files_for_missing_post_is_not_found() {
    let ctx = build_gateway().await;

    let result = ctx
        .gateway
        .posts
        .store_files_for_post(EntityId(404), vec![png("a.png")])
        .await;
    assert!(matches!(result, Err(GatewayError::Record(_))));
    assert_eq!(ctx.file_index.len(), 0, "no file records for a dead parent");
}

#[tokio::test]
async fn save_with_files_creates_and_attaches_in_one_call() {
    let ctx = build_gateway().await;

    let created = ctx
        .gateway
        .posts
        .save_with_files(
            Post::new("all in one", Privacy::Public),
            vec![png("one.png"), png("two.png")],
        )
        .await
        .unwrap();

    assert_eq!(created.num_files, 2);
    assert_eq!(created.files.len(), 2);

    // The mirror document was built at post-save time, before the
    // attachments landed; it stays behind until the next write or a
    // reindex run.
    let hits = ctx
        .gateway
        .posts
        .search("\"all in one\"", &PageRequest::of(0, 10))
        .await
        .unwrap();
    assert_eq!(hits.total, 1);
    assert!(hits.items[0].files.is_empty());

    ctx.gateway.reindex_all().await.unwrap();
    let hits = ctx
        .gateway
        .posts
        .search("\"all in one\"", &PageRequest::of(0, 10))
        .await
        .unwrap();
    assert_eq!(hits.items[0].files.len(), 2);
}
