//! HTTP client for the Internet Archive.

use crate::protocol::{FileEntry, MetadataResponse, ScrapeResponse};
use async_trait::async_trait;
use iasync_core::{ArchiveConfig, Item, ItemCursor, ItemSource, SearchQuery, SourceError};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Path of the cursor-based search API
const SCRAPE_PATH: &str = "/services/search/v1/scrape";

/// Client options.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Identifiers requested per search page (the scrape API wants at least 100)
    pub page_size: usize,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::from_config(&ArchiveConfig::default())
    }
}

impl ArchiveOptions {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            page_size: config.page_size,
            user_agent: format!("iasync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Internet Archive item source.
#[derive(Clone)]
pub struct ArchiveClient {
    http: Client,
    base_url: String,
    page_size: usize,
}

impl ArchiveClient {
    /// Create a new client with the given options.
    pub fn new(options: ArchiveOptions) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            page_size: options.page_size,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of identifiers matching `query`.
    pub async fn scrape_page(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<ScrapeResponse, SourceError> {
        let url = format!("{}{}", self.base_url, SCRAPE_PATH);
        let count = self.page_size.to_string();

        let mut params = vec![("q", query), ("fields", "identifier"), ("count", count.as_str())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }

        debug!(query = %query, cursor = ?cursor, "Fetching search page");
        self.get_json(&url, &params).await
    }

    /// Fetch an item's file list.
    pub async fn item(&self, identifier: &str) -> Result<Item, SourceError> {
        let url = self.metadata_url(identifier)?;

        debug!(item = %identifier, "Fetching item metadata");
        let metadata: MetadataResponse = self.get_json(url.as_str(), &[]).await?;

        Ok(Item {
            identifier: identifier.to_string(),
            files: metadata
                .files
                .into_iter()
                .map(FileEntry::into_record)
                .collect(),
        })
    }

    /// Metadata API URL with the identifier as one percent-encoded path segment.
    pub fn metadata_url(&self, identifier: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SourceError::Transport(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport(format!("{}: not a base URL", self.base_url)))?
            .pop_if_empty()
            .push("metadata")
            .push(identifier);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ItemSource for ArchiveClient {
    async fn search(&self, query: &SearchQuery) -> Result<Box<dyn ItemCursor>, SourceError> {
        Ok(Box::new(ArchiveCursor::new(self.clone(), query.to_string())))
    }
}

/// Lazily pages through search results, resolving one item per call.
pub struct ArchiveCursor {
    client: ArchiveClient,
    query: String,
    pending: VecDeque<String>,
    next_cursor: Option<String>,
    exhausted: bool,
}

impl ArchiveCursor {
    pub fn new(client: ArchiveClient, query: String) -> Self {
        Self {
            client,
            query,
            pending: VecDeque::new(),
            next_cursor: None,
            exhausted: false,
        }
    }
}

#[async_trait]
impl ItemCursor for ArchiveCursor {
    async fn next_item(&mut self) -> Result<Option<Item>, SourceError> {
        loop {
            if let Some(identifier) = self.pending.pop_front() {
                return self.client.item(&identifier).await.map(Some);
            }

            if self.exhausted {
                return Ok(None);
            }

            let page = self
                .client
                .scrape_page(&self.query, self.next_cursor.as_deref())
                .await?;

            debug!(
                items = page.items.len(),
                total = ?page.total,
                more = page.cursor.is_some(),
                "Received search page"
            );

            self.pending
                .extend(page.items.into_iter().map(|item| item.identifier));
            self.exhausted = page.cursor.is_none();
            self.next_cursor = page.cursor;
        }
    }
}
