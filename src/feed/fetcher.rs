//! Feed document fetcher.
//!
//! Retrieves a feed document over HTTP, validates that the response looks
//! like an RSS/Atom payload, and parses it into a [`ParsedFeed`].

use std::time::Duration;

use feed_rs::parser;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::error::{FeedhubError, Result};
use crate::feed::types::{ParsedFeed, ParsedItem, MAX_FEED_SIZE};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent string for feed fetching.
const USER_AGENT: &str = "feedhub/0.1 (RSS Aggregator)";

/// HTTP fetcher for syndication feeds.
///
/// The timeout bounds the whole request so one slow feed cannot dominate
/// a scheduler batch; it comes from `scheduler.fetch_timeout_ms`.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new fetcher with the given total request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedhubError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch and parse a feed from the given URL.
    ///
    /// Fails on network errors, timeouts, non-2xx status, a content-type
    /// that does not look like a feed, or an unparseable document. The
    /// caller treats any failure as "skip this feed for this cycle".
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedhubError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FeedhubError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_feed_content_type(&content_type) {
            return Err(FeedhubError::Fetch(format!(
                "not a feed content-type: {}",
                content_type
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_FEED_SIZE {
                return Err(FeedhubError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, MAX_FEED_SIZE
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedhubError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > MAX_FEED_SIZE {
            return Err(FeedhubError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_FEED_SIZE
            )));
        }

        parse_feed(&bytes)
    }
}

/// Check whether a content-type header plausibly carries an RSS/Atom payload.
fn is_feed_content_type(content_type: &str) -> bool {
    let lower = content_type.to_lowercase();
    lower.contains("xml") || lower.contains("rss") || lower.contains("atom")
}

/// Validate a feed source URL at creation time.
///
/// Checks that the URL is a syntactically valid absolute http(s) URL with
/// a host. Reachability is not checked here.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| FeedhubError::Validation(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FeedhubError::Validation(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(FeedhubError::Validation("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse feed bytes into a ParsedFeed.
fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)
        .map_err(|e| FeedhubError::Fetch(format!("failed to parse feed: {}", e)))?;

    let title = feed
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "Untitled Feed".to_string());

    let description = feed.description.map(|d| d.content);
    let link = feed.links.first().map(|l| l.href.clone());

    let items: Vec<ParsedItem> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let item_title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let item_link = entry.links.first().map(|l| l.href.clone());
            let item_description = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body));
            // A pubDate the parser could not understand surfaces as None;
            // the ingestor skips such items without failing the feed.
            let published_at = entry.published.or(entry.updated);

            ParsedItem {
                title: item_title,
                link: item_link,
                description: item_description,
                published_at,
            }
        })
        .collect();

    Ok(ParsedFeed {
        title,
        description,
        link,
        items,
    })
}
