//! End-to-end refresh tests for feedhub.
//!
//! These tests stand up a minimal local HTTP server serving canned feed
//! documents, then drive scheduler ticks against it and assert on the
//! stored posts and feed timestamps.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use feedhub::config::SchedulerConfig;
use feedhub::feed::{FeedRepository, FeedScheduler, PostRepository};
use feedhub::{Database, NewFeed, NewUser, UserRepository};

const RSS_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Integration Feed</title>
    <link>https://example.com</link>
    <description>Test feed</description>
    <item>
      <title>First</title>
      <link>https://example.com/articles/1</link>
      <description>First article</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://example.com/articles/2</link>
      <description>Second article</description>
      <pubDate>Tue, 03 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://example.com/articles/3</link>
      <description>Bad publish date</description>
      <pubDate>not-a-date</pubDate>
    </item>
  </channel>
</rss>"#;

/// Serve the same HTTP response to every connection, forever.
///
/// Returns the bound address. The listener task dies with the runtime.
async fn serve(status: &str, content_type: &str, body: &str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let response = response.clone();
            tokio::spawn(async move {
                // Drain the request head before answering
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

fn scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        interval_secs: 1,
        concurrency: 10,
        fetch_timeout_ms: 2000,
    }
}

async fn setup_db() -> (Arc<Database>, i64) {
    let db = Arc::new(Database::open_in_memory().await.unwrap());
    let user = UserRepository::new(db.pool())
        .create(&NewUser::new("alice"))
        .await
        .unwrap();
    (db, user.id)
}

#[tokio::test]
async fn test_refresh_stores_new_posts() {
    let addr = serve("200 OK", "application/rss+xml", RSS_DOC).await;
    let (db, user_id) = setup_db().await;

    let feed = FeedRepository::new(db.pool())
        .create(&NewFeed::new(
            "Integration",
            format!("http://{}/feed.xml", addr),
            user_id,
        ))
        .await
        .unwrap();

    let scheduler = FeedScheduler::new(Arc::clone(&db), &scheduler_config()).unwrap();
    scheduler.refresh_due_feeds().await;

    // Two dated items stored, the undated one skipped
    let posts = PostRepository::new(db.pool())
        .list_by_feed(feed.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "Second");
    assert_eq!(posts[1].title, "First");

    // Feed timestamp advanced
    let after = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert!(after.last_fetched_at.is_some());
}

#[tokio::test]
async fn test_repeated_refresh_is_idempotent() {
    let addr = serve("200 OK", "application/rss+xml", RSS_DOC).await;
    let (db, user_id) = setup_db().await;

    let feed = FeedRepository::new(db.pool())
        .create(&NewFeed::new(
            "Integration",
            format!("http://{}/feed.xml", addr),
            user_id,
        ))
        .await
        .unwrap();

    let scheduler = FeedScheduler::new(Arc::clone(&db), &scheduler_config()).unwrap();
    for _ in 0..3 {
        scheduler.refresh_due_feeds().await;
    }

    // Identical document ingested three times, still exactly two posts
    let count = PostRepository::new(db.pool())
        .count_by_feed(feed.id)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_http_error_marks_feed_and_stores_nothing() {
    let addr = serve("404 Not Found", "text/html", "gone").await;
    let (db, user_id) = setup_db().await;

    let feed = FeedRepository::new(db.pool())
        .create(&NewFeed::new(
            "Missing",
            format!("http://{}/feed.xml", addr),
            user_id,
        ))
        .await
        .unwrap();

    let scheduler = FeedScheduler::new(Arc::clone(&db), &scheduler_config()).unwrap();
    scheduler.refresh_due_feeds().await;

    let count = PostRepository::new(db.pool())
        .count_by_feed(feed.id)
        .await
        .unwrap();
    assert_eq!(count, 0);

    // Failure still advances the fetch timestamp
    let after = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert!(after.last_fetched_at.is_some());
}

#[tokio::test]
async fn test_wrong_content_type_skips_feed() {
    let addr = serve("200 OK", "text/html", RSS_DOC).await;
    let (db, user_id) = setup_db().await;

    let feed = FeedRepository::new(db.pool())
        .create(&NewFeed::new(
            "NotAFeed",
            format!("http://{}/page.html", addr),
            user_id,
        ))
        .await
        .unwrap();

    let scheduler = FeedScheduler::new(Arc::clone(&db), &scheduler_config()).unwrap();
    scheduler.refresh_due_feeds().await;

    let count = PostRepository::new(db.pool())
        .count_by_feed(feed.id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_malformed_document_skips_feed() {
    let addr = serve("200 OK", "application/rss+xml", "this is not xml at all").await;
    let (db, user_id) = setup_db().await;

    let feed = FeedRepository::new(db.pool())
        .create(&NewFeed::new(
            "Garbage",
            format!("http://{}/feed.xml", addr),
            user_id,
        ))
        .await
        .unwrap();

    let scheduler = FeedScheduler::new(Arc::clone(&db), &scheduler_config()).unwrap();
    scheduler.refresh_due_feeds().await;

    let count = PostRepository::new(db.pool())
        .count_by_feed(feed.id)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let after = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert!(after.last_fetched_at.is_some());
}

#[tokio::test]
async fn test_one_broken_feed_does_not_stall_the_batch() {
    let good_addr = serve("200 OK", "application/rss+xml", RSS_DOC).await;
    let (db, user_id) = setup_db().await;

    let feeds = FeedRepository::new(db.pool());
    let broken = feeds
        .create(&NewFeed::new(
            "Broken",
            "http://127.0.0.1:1/feed.xml",
            user_id,
        ))
        .await
        .unwrap();
    let good = feeds
        .create(&NewFeed::new(
            "Good",
            format!("http://{}/feed.xml", good_addr),
            user_id,
        ))
        .await
        .unwrap();

    let scheduler = FeedScheduler::new(Arc::clone(&db), &scheduler_config()).unwrap();
    scheduler.refresh_due_feeds().await;

    // The healthy sibling ingested normally
    let posts = PostRepository::new(db.pool());
    assert_eq!(posts.count_by_feed(good.id).await.unwrap(), 2);
    assert_eq!(posts.count_by_feed(broken.id).await.unwrap(), 0);

    // Both feeds marked fetched
    for id in [broken.id, good.id] {
        let feed = feeds.get_by_id(id).await.unwrap().unwrap();
        assert!(feed.last_fetched_at.is_some());
    }
}
