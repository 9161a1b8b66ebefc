use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

/// One entry as parsed from a remote feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        let title = entry.title.map(|t| t.content);

        // Atom entries may list self/edit links before the article itself
        let article = entry
            .links
            .iter()
            .position(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .unwrap_or(0);
        let link = entry.links.into_iter().nth(article).map(|l| l.href);

        let published = entry.published.or(entry.updated);

        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        Self {
            title,
            link,
            published,
            summary,
        }
    }
}

/// Anything that can turn a feed URL into raw entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError>;
}

/// Fetches feeds over HTTP and parses RSS, Atom and JSON Feed bodies.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("DiplomaticNews/1.0 (Feed Aggregator)")
            .build()?;

        Ok(Self { client })
    }

    /// Parse a feed document that has already been downloaded.
    pub fn parse_entries(body: &[u8]) -> Result<Vec<RawEntry>, FetchError> {
        let parsed = parser::parse(body)?;
        Ok(parsed.entries.into_iter().map(RawEntry::from).collect())
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let entries = Self::parse_entries(&bytes)?;
        debug!("Parsed {} entries from {}", entries.len(), url);
        Ok(entries)
    }
}
