//! Feed ingestion module for feedhub.
//!
//! Covers the refresh pipeline: fetching feed documents, ingesting their
//! items as posts, and the scheduler that drives both on an interval.

pub mod fetcher;
pub mod ingestor;
pub mod repository;
pub mod scheduler;
pub mod types;

pub use fetcher::{validate_url, FeedFetcher};
pub use ingestor::ItemIngestor;
pub use repository::{FeedRepository, PostRepository};
pub use scheduler::{start_scheduler, FeedScheduler};
pub use types::{
    Feed, FetchOutcome, IngestReport, NewFeed, NewPost, ParsedFeed, ParsedItem, Post,
    MAX_DESCRIPTION_LENGTH, MAX_FEED_SIZE,
};
