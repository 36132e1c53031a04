//! Feed refresh scheduler.
//!
//! A long-lived loop that wakes on a fixed interval, selects the feeds
//! most overdue for a refetch, fans out one concurrent fetch-and-ingest
//! unit per feed, and joins the whole batch before the next tick. No
//! feed-level or item-level failure ever stops the loop.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::db::Database;
use crate::error::Result;
use crate::feed::fetcher::FeedFetcher;
use crate::feed::ingestor::ItemIngestor;
use crate::feed::repository::FeedRepository;
use crate::feed::types::{Feed, FetchOutcome};

/// Periodic feed refresh scheduler.
///
/// The batch size equals the concurrency bound: every selected feed is
/// dispatched immediately and in parallel, there is no secondary queue.
pub struct FeedScheduler {
    db: Arc<Database>,
    fetcher: Arc<FeedFetcher>,
    tick_interval: Duration,
    concurrency: usize,
}

impl FeedScheduler {
    /// Create a scheduler from the given configuration.
    pub fn new(db: Arc<Database>, config: &SchedulerConfig) -> Result<Self> {
        let fetcher = FeedFetcher::new(Duration::from_millis(config.fetch_timeout_ms))?;
        Ok(Self {
            db,
            fetcher: Arc::new(fetcher),
            tick_interval: Duration::from_secs(config.interval_secs),
            concurrency: config.concurrency,
        })
    }

    /// Run the scheduler loop.
    ///
    /// Runs indefinitely; the only way out is process termination.
    pub async fn run(&self) {
        info!(
            "Feed scheduler started ({} concurrent feeds every {} seconds)",
            self.concurrency,
            self.tick_interval.as_secs()
        );

        let mut timer = interval(self.tick_interval);

        loop {
            timer.tick().await;
            self.refresh_due_feeds().await;
        }
    }

    /// Run a single scheduler tick: select, dispatch, await the batch.
    ///
    /// A selection failure skips the whole tick; the next interval will
    /// try again. Per-feed failures are absorbed inside their units.
    pub async fn refresh_due_feeds(&self) {
        let feeds = match FeedRepository::new(self.db.pool())
            .select_due_for_fetch(self.concurrency)
            .await
        {
            Ok(feeds) => feeds,
            Err(e) => {
                error!("Failed to select feeds due for refresh: {}", e);
                return;
            }
        };

        if feeds.is_empty() {
            debug!("No feeds due for refresh");
            return;
        }

        info!("Refreshing {} feed(s)", feeds.len());

        let handles: Vec<JoinHandle<FetchOutcome>> = feeds
            .into_iter()
            .map(|feed| {
                let db = Arc::clone(&self.db);
                let fetcher = Arc::clone(&self.fetcher);
                tokio::spawn(async move { refresh_feed(db, fetcher, feed).await })
            })
            .collect();

        // The tick does not advance until every unit reports completion;
        // one unit's failure never cancels its siblings.
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        for result in join_all(handles).await {
            match result {
                Ok(FetchOutcome::Ingested(_)) => succeeded += 1,
                Ok(FetchOutcome::Failed(_)) => failed += 1,
                Err(e) => {
                    error!("Feed refresh task panicked: {}", e);
                    failed += 1;
                }
            }
        }

        info!(
            "Refresh batch complete: {} succeeded, {} failed",
            succeeded, failed
        );
    }
}

/// Fetch and ingest a single feed, then advance its fetch timestamp.
///
/// The feed is marked fetched even when the fetch failed entirely, so a
/// permanently broken feed takes its natural turn in the eligibility
/// ordering instead of starving other feeds every tick.
async fn refresh_feed(db: Arc<Database>, fetcher: Arc<FeedFetcher>, feed: Feed) -> FetchOutcome {
    debug!("Refreshing feed {} ({})", feed.name, feed.url);

    let outcome = match fetcher.fetch(&feed.url).await {
        Ok(parsed) => {
            let report = ItemIngestor::new(db.pool()).ingest(feed.id, parsed.items).await;
            info!(
                "Feed {} ({}) processed: {} new, {} known, {} skipped",
                feed.name, feed.id, report.created, report.duplicates, report.skipped
            );
            FetchOutcome::Ingested(report)
        }
        Err(e) => {
            warn!("Failed to fetch feed {} ({}): {}", feed.name, feed.url, e);
            FetchOutcome::Failed(e.to_string())
        }
    };

    if let Err(e) = FeedRepository::new(db.pool()).mark_fetched(feed.id).await {
        error!("Failed to mark feed {} as fetched: {}", feed.id, e);
    }

    outcome
}

/// Start the scheduler as a background task.
pub fn start_scheduler(db: Arc<Database>, config: &SchedulerConfig) -> Result<JoinHandle<()>> {
    let scheduler = FeedScheduler::new(db, config)?;
    Ok(tokio::spawn(async move {
        scheduler.run().await;
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::feed::types::NewFeed;

    fn test_config() -> SchedulerConfig {
        SchedulerConfig {
            interval_secs: 1,
            concurrency: 2,
            fetch_timeout_ms: 500,
        }
    }

    async fn setup() -> (Arc<Database>, i64) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice"))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_scheduler_new() {
        let (db, _) = setup().await;
        let scheduler = FeedScheduler::new(db, &test_config()).unwrap();
        assert_eq!(scheduler.tick_interval, Duration::from_secs(1));
        assert_eq!(scheduler.concurrency, 2);
    }

    #[tokio::test]
    async fn test_tick_with_no_feeds() {
        let (db, _) = setup().await;
        let scheduler = FeedScheduler::new(db, &test_config()).unwrap();

        // Must simply return, not hang or error
        scheduler.refresh_due_feeds().await;
    }

    #[tokio::test]
    async fn test_failed_fetch_still_marks_feed_fetched() {
        let (db, user_id) = setup().await;
        let repo = FeedRepository::new(db.pool());

        // Nothing is listening on this port; the fetch fails immediately
        let feed = repo
            .create(&NewFeed::new("Broken", "http://127.0.0.1:1/feed.xml", user_id))
            .await
            .unwrap();
        assert!(feed.last_fetched_at.is_none());

        let scheduler = FeedScheduler::new(Arc::clone(&db), &test_config()).unwrap();
        scheduler.refresh_due_feeds().await;

        let after = repo.get_by_id(feed.id).await.unwrap().unwrap();
        assert!(after.last_fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_broken_feed_does_not_monopolize_selection() {
        let (db, user_id) = setup().await;
        let repo = FeedRepository::new(db.pool());

        let broken = repo
            .create(&NewFeed::new("Broken", "http://127.0.0.1:1/feed.xml", user_id))
            .await
            .unwrap();
        let other = repo
            .create(&NewFeed::new("Other", "http://127.0.0.1:1/other.xml", user_id))
            .await
            .unwrap();

        let config = SchedulerConfig {
            concurrency: 1,
            ..test_config()
        };
        let scheduler = FeedScheduler::new(Arc::clone(&db), &config).unwrap();

        // First tick takes the broken feed (created first, never fetched)
        scheduler.refresh_due_feeds().await;
        assert!(repo
            .get_by_id(broken.id)
            .await
            .unwrap()
            .unwrap()
            .last_fetched_at
            .is_some());

        // Second tick must move on to the other feed
        scheduler.refresh_due_feeds().await;
        assert!(repo
            .get_by_id(other.id)
            .await
            .unwrap()
            .unwrap()
            .last_fetched_at
            .is_some());
    }
}
