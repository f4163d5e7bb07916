//! Notion connector implementation
//!
//! Pages through a Notion database with the `databases/{id}/query` endpoint,
//! following `next_cursor` until `has_more` is false.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{AppConfig, ConfigError, MAX_NOTION_PAGE_SIZE, NotionCredentials};
use crate::connectors::trait_::{FetchError, FetchedRecords, RecordSource};

pub const NOTION_PROVIDER_SLUG: &str = "notion";

/// Errors raised while building a [`NotionClient`].
#[derive(Debug, Error)]
pub enum NotionSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid Notion API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

/// One page of a database query response.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Notion database client
pub struct NotionClient {
    http: reqwest::Client,
    query_url: Url,
    token: String,
    notion_version: String,
    page_size: usize,
}

impl NotionClient {
    /// Create a client for one database.
    pub fn new(
        api_base: &str,
        credentials: NotionCredentials,
        notion_version: impl Into<String>,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, NotionSetupError> {
        let query_url = Url::parse(&format!(
            "{}/databases/{}/query",
            api_base.trim_end_matches('/'),
            credentials.database_id
        ))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("habits-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            query_url,
            token: credentials.token,
            notion_version: notion_version.into(),
            page_size: page_size.clamp(1, MAX_NOTION_PAGE_SIZE),
        })
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotionSetupError> {
        let credentials = config.notion_credentials()?;
        Self::new(
            &config.notion_api_base,
            credentials,
            config.notion_version.clone(),
            config.notion_page_size,
            config.http_timeout(),
        )
    }

    /// Fetch a single page of results.
    pub async fn query_page(
        &self,
        page_size: usize,
        start_cursor: Option<&str>,
    ) -> Result<QueryResponse, FetchError> {
        let body = QueryRequest {
            page_size,
            start_cursor,
        };

        let response = self
            .http
            .post(self.query_url.clone())
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.notion_version)
            .json(&body)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(FetchError::http(status.as_u16(), body));
        }

        let bytes = response.bytes().await.map_err(FetchError::Network)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordSource for NotionClient {
    fn name(&self) -> &str {
        NOTION_PROVIDER_SLUG
    }

    async fn fetch_all_records(&self, limit: Option<usize>) -> FetchedRecords {
        let (page_size, follow_cursor) = match limit {
            Some(n) => (n.clamp(1, MAX_NOTION_PAGE_SIZE), false),
            None => (self.page_size, true),
        };

        let mut fetched = FetchedRecords::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = match self.query_page(page_size, cursor.as_deref()).await {
                Ok(page) => page,
                Err(err) => {
                    if fetched.pages == 0 {
                        error!(error = %err, "Failed to fetch first page");
                    } else {
                        warn!(
                            error = %err,
                            pages = fetched.pages,
                            records = fetched.records.len(),
                            "Fetch interrupted; keeping records from earlier pages"
                        );
                    }
                    fetched.interrupted = Some(err);
                    break;
                }
            };

            fetched.pages += 1;
            debug!(
                page = fetched.pages,
                results = page.results.len(),
                has_more = page.has_more,
                "Received page"
            );
            fetched.records.extend(page.results);

            if !follow_cursor || !page.has_more {
                break;
            }

            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) => {
                    debug!(cursor = %next, "Requesting next page");
                    cursor = Some(next);
                }
                None => {
                    warn!(pages = fetched.pages, "has_more set without next_cursor");
                    fetched.interrupted = Some(FetchError::MissingCursor);
                    break;
                }
            }
        }

        info!(
            total = fetched.records.len(),
            pages = fetched.pages,
            complete = fetched.is_complete(),
            "Fetched Notion records"
        );

        fetched
    }
}
