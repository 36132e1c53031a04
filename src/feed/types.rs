//! Feed and post types for feedhub.

use chrono::{DateTime, Utc};

/// Maximum length for a post description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// Maximum feed document size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// A configured syndication feed to be polled periodically.
#[derive(Debug, Clone)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Feed display name.
    pub name: String,
    /// Source URL of the feed document.
    pub url: String,
    /// User ID who owns the feed.
    pub user_id: i64,
    /// Last time the feed was fetched. None means never fetched,
    /// which makes the feed immediately eligible for refresh.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Feed display name.
    pub name: String,
    /// Source URL of the feed document.
    pub url: String,
    /// User ID who owns the feed.
    pub user_id: i64,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: i64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// One ingested feed item, persisted once per (feed, URL).
#[derive(Debug, Clone)]
pub struct Post {
    /// Post ID.
    pub id: i64,
    /// Feed ID this post belongs to.
    pub feed_id: i64,
    /// Post title.
    pub title: String,
    /// Link to the original article.
    pub url: String,
    /// Post description/summary.
    pub description: Option<String>,
    /// When the item was published.
    pub published_at: DateTime<Utc>,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New post for creation.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Feed ID.
    pub feed_id: i64,
    /// Post title.
    pub title: String,
    /// Link to the original article.
    pub url: String,
    /// Post description.
    pub description: Option<String>,
    /// When the item was published.
    pub published_at: DateTime<Utc>,
}

impl NewPost {
    /// Create a new post.
    pub fn new(
        feed_id: i64,
        title: impl Into<String>,
        url: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            description: None,
            published_at,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let desc = description.into();
        // Truncate if too long
        if desc.len() > MAX_DESCRIPTION_LENGTH {
            self.description = Some(desc.chars().take(MAX_DESCRIPTION_LENGTH).collect());
        } else {
            self.description = Some(desc);
        }
        self
    }
}

/// Parsed feed document from an external source.
///
/// Transient: produced by the fetcher, consumed by the ingestor,
/// discarded when the batch unit completes. Never persisted as a whole.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    /// Feed title.
    pub title: String,
    /// Feed description.
    pub description: Option<String>,
    /// Site URL.
    pub link: Option<String>,
    /// Parsed items, in document order.
    pub items: Vec<ParsedItem>,
}

/// Parsed item from a feed document.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    /// Item title.
    pub title: String,
    /// Link to the original article.
    pub link: Option<String>,
    /// Item description.
    pub description: Option<String>,
    /// Publication date, None when missing or unparseable in the document.
    pub published_at: Option<DateTime<Utc>>,
}

/// Outcome of one feed's fetch-and-ingest attempt within a scheduler tick.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The feed document was fetched and its items processed.
    Ingested(IngestReport),
    /// The fetch itself failed; no items were processed.
    Failed(String),
}

/// Counts from one ingestion pass over a feed's items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Posts newly stored this pass.
    pub created: usize,
    /// Items already present (duplicate (feed, URL)).
    pub duplicates: usize,
    /// Items skipped: missing/unparseable date or a persistence error.
    pub skipped: usize,
}

impl IngestReport {
    /// Total number of items seen.
    pub fn total(&self) -> usize {
        self.created + self.duplicates + self.skipped
    }
}
