//! App Store customer review feed client.
//!
//! Reads the first page of the most-recent-first JSON feed only; windows
//! longer than what one page covers can miss reviews.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{Review, Window};
use crate::error::FetchError;
use crate::port::ItemFetcher;

pub const DEFAULT_FEED_BASE_URL: &str = "https://itunes.apple.com";

#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    feed: ReviewsFeed,
}

#[derive(Debug, Deserialize)]
struct ReviewsFeed {
    #[serde(default)]
    entry: Option<OneOrMany<FeedEntry>>,
}

/// The feed collapses a single entry into an object instead of an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    author: Option<FeedAuthor>,
    #[serde(default)]
    title: Label,
    #[serde(default)]
    content: Label,
    #[serde(default)]
    updated: Label,
    #[serde(rename = "im:rating", default)]
    rating: Label,
}

#[derive(Debug, Deserialize)]
struct FeedAuthor {
    #[serde(default)]
    name: Label,
}

#[derive(Debug, Default, Deserialize)]
struct Label {
    #[serde(default)]
    label: String,
}

impl From<FeedEntry> for Review {
    fn from(entry: FeedEntry) -> Self {
        Self {
            author: entry.author.map(|a| a.name.label).unwrap_or_default(),
            title: entry.title.label,
            content: entry.content.label,
            date: entry.updated.label,
            rating: entry.rating.label,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RssReviewFetcher {
    client: Client,
    base_url: Url,
    app_id: String,
}

impl RssReviewFetcher {
    pub fn new(
        base_url: &str,
        app_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            base_url,
            app_id: app_id.into(),
        })
    }

    fn feed_url(&self) -> Result<Url, FetchError> {
        let path = format!(
            "us/rss/customerreviews/id={}/sortBy=mostRecent/page=1/json",
            self.app_id
        );
        Ok(self.base_url.join(&path)?)
    }
}

#[async_trait]
impl ItemFetcher for RssReviewFetcher {
    async fn fetch_items(&self, window: Window) -> Result<Vec<Review>, FetchError> {
        let url = self.feed_url()?;
        debug!(%url, "fetching review feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let body: ReviewsResponse = response.json().await.map_err(FetchError::Decode)?;
        let entries = body.feed.entry.map(OneOrMany::into_vec).unwrap_or_default();
        let fetched = entries.len();

        let reviews: Vec<Review> = entries
            .into_iter()
            .filter(|entry| match DateTime::parse_from_rfc3339(&entry.updated.label) {
                Ok(updated) => window.contains(updated.with_timezone(&Utc)),
                Err(e) => {
                    warn!(
                        updated = %entry.updated.label,
                        error = %e,
                        "skipping review with unparseable timestamp"
                    );
                    false
                }
            })
            .map(Review::from)
            .collect();

        info!(
            app_id = %self.app_id,
            fetched,
            in_window = reviews.len(),
            "fetched reviews"
        );
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base: &str) -> RssReviewFetcher {
        RssReviewFetcher::new(base, "595068606", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn feed_url_points_at_most_recent_first_page() {
        let url = fetcher(DEFAULT_FEED_BASE_URL).feed_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://itunes.apple.com/us/rss/customerreviews/id=595068606/sortBy=mostRecent/page=1/json"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = RssReviewFetcher::new("not a url", "1", Duration::from_secs(1));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn single_entry_feed_decodes() {
        let body = r#"{"feed":{"entry":{"author":{"name":{"label":"kim"}},
            "updated":{"label":"2024-05-01T10:00:00-07:00"},
            "im:rating":{"label":"4"},"title":{"label":"Nice"},
            "content":{"label":"Works well"}}}}"#;

        let parsed: ReviewsResponse = serde_json::from_str(body).unwrap();
        let reviews: Vec<Review> = parsed
            .feed
            .entry
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(Review::from)
            .collect();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author, "kim");
        assert_eq!(reviews[0].rating, "4");
    }

    #[test]
    fn feed_without_entries_decodes_empty() {
        let parsed: ReviewsResponse = serde_json::from_str(r#"{"feed":{}}"#).unwrap();
        assert!(parsed.feed.entry.is_none());
    }
}
