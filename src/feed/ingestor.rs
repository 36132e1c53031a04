//! Item ingestor.
//!
//! Converts a feed's parsed items into posts and writes each one.
//! Ingestion is deliberately not transactional: a bad item is skipped,
//! an already-stored item is a no-op, and siblings always proceed.

use sqlx::SqlitePool;
use tracing::{debug, error, warn};

use crate::feed::repository::PostRepository;
use crate::feed::types::{IngestReport, NewPost, ParsedItem};

/// Ingests parsed feed items into the posts table.
pub struct ItemIngestor<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ItemIngestor<'a> {
    /// Create a new ingestor against the given pool.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a feed's items, in document order.
    ///
    /// Per item: a missing or unparseable publication date skips the item;
    /// a duplicate (feed_id, url) is success-with-no-effect; any other
    /// persistence error is logged and the item skipped. Nothing here
    /// fails the batch unit.
    pub async fn ingest(&self, feed_id: i64, items: Vec<ParsedItem>) -> IngestReport {
        let posts = PostRepository::new(self.pool);
        let mut report = IngestReport::default();

        for item in items {
            let published_at = match item.published_at {
                Some(dt) => dt,
                None => {
                    warn!(
                        "Skipping item '{}' in feed {}: missing or unparseable publication date",
                        item.title, feed_id
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let url = match item.link {
                Some(url) => url,
                None => {
                    warn!(
                        "Skipping item '{}' in feed {}: no link",
                        item.title, feed_id
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let mut new_post = NewPost::new(feed_id, &item.title, &url, published_at);
            if let Some(description) = item.description {
                new_post = new_post.with_description(description);
            }

            match posts.create(&new_post).await {
                Ok(_) => report.created += 1,
                Err(e) if e.is_duplicate() => {
                    // Already ingested in a prior cycle
                    debug!("Post already exists for feed {}: {}", feed_id, url);
                    report.duplicates += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to store post '{}' ({}) for feed {}: {}",
                        new_post.title, url, feed_id, e
                    );
                    report.skipped += 1;
                }
            }
        }

        report
    }
}
