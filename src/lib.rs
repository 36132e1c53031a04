//! feedhub - RSS/Atom feed aggregation service.
//!
//! Polls configured syndication feeds on a fixed schedule and stores
//! newly discovered items, idempotently across polling cycles.

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;

pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FeedhubError, Result};
pub use feed::{
    start_scheduler, Feed, FeedFetcher, FeedRepository, FeedScheduler, FetchOutcome, IngestReport,
    ItemIngestor, NewFeed, NewPost, ParsedFeed, ParsedItem, Post, PostRepository,
};
