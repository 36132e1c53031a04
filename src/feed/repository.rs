//! Feed and post repositories.
//!
//! `FeedRepository` carries the refresh policy's persistence contract:
//! selecting feeds due for a refetch (oldest-fetched first, never-fetched
//! first of all) and advancing `last_fetched_at` after a batch unit
//! completes. `PostRepository` persists ingested items, signaling a
//! (feed_id, url) conflict as a distinguishable error.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::parse_datetime;
use crate::error::{FeedhubError, Result};
use crate::feed::fetcher::validate_url;
use crate::feed::types::{Feed, NewFeed, NewPost, Post};

/// Row type for a feed from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    name: String,
    url: String,
    user_id: i64,
    last_fetched_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_datetime(&s)),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a post from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: i64,
    feed_id: i64,
    title: String,
    url: String,
    description: Option<String>,
    published_at: String,
    created_at: String,
    updated_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: parse_datetime(&row.published_at).unwrap_or_else(Utc::now),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// The URL must be a syntactically valid absolute http(s) URL; this is
    /// the creation-time shape check, the fetcher does not re-validate it.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        if feed.name.is_empty() {
            return Err(FeedhubError::Validation("name is required".to_string()));
        }
        validate_url(&feed.url)?;

        let result = sqlx::query("INSERT INTO feeds (name, url, user_id) VALUES (?, ?, ?)")
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id)
            .execute(self.pool)
            .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FeedhubError::NotFound("feed".to_string()))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, last_fetched_at, created_at, updated_at
             FROM feeds WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, last_fetched_at, created_at, updated_at
             FROM feeds WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Feed::from))
    }

    /// List all feeds.
    pub async fn list(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, last_fetched_at, created_at, updated_at
             FROM feeds ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// Select up to `limit` feeds due for a refetch.
    ///
    /// Never-fetched feeds come first, then the least recently fetched.
    /// The id tiebreak keeps the ordering deterministic.
    pub async fn select_due_for_fetch(&self, limit: usize) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(
            "SELECT id, name, url, user_id, last_fetched_at, created_at, updated_at
             FROM feeds
             ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// Set a feed's `last_fetched_at` to now.
    ///
    /// Called after every batch unit, whether or not the fetch succeeded,
    /// so a broken feed moves to the back of the eligibility ordering
    /// instead of being retried every tick.
    pub async fn mark_fetched(&self, id: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FeedhubError::NotFound("feed".to_string()));
        }
        Ok(())
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post.
    ///
    /// Returns [`FeedhubError::Duplicate`] when a post with the same
    /// (feed_id, url) already exists; every other failure maps to
    /// [`FeedhubError::Database`].
    pub async fn create(&self, post: &NewPost) -> Result<Post> {
        let result = sqlx::query(
            "INSERT INTO posts (feed_id, title, url, description, published_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at.to_rfc3339())
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FeedhubError::NotFound("post".to_string()))
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    /// List posts for a feed, newest first.
    pub async fn list_by_feed(&self, feed_id: i64, limit: usize, offset: usize) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
             FROM posts WHERE feed_id = ?
             ORDER BY published_at DESC, id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(feed_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Count posts for a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
