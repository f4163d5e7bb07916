//! Record source trait definition
//!
//! Defines the interface the pipeline uses to pull raw records from an
//! upstream paged API, together with the fetch outcome and error types.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of characters of an upstream error body kept for diagnostics.
const BODY_SNIPPET_CHARS: usize = 200;

/// Transport-level failure while paging through an upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a non-success status
    #[error(
        "upstream returned HTTP {status}: {}",
        body_snippet.as_deref().unwrap_or("<empty body>")
    )]
    Http {
        status: u16,
        body_snippet: Option<String>,
    },
    /// Connection, TLS or timeout failure
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// Response body was not the expected JSON document
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
    /// `has_more` was set without a continuation cursor
    #[error("upstream reported more pages but returned no continuation cursor")]
    MissingCursor,
}

impl FetchError {
    /// Builds an HTTP error, keeping at most 200 characters of the body.
    pub fn http(status: u16, body: Option<String>) -> Self {
        let body_snippet = body.filter(|b| !b.is_empty()).map(|b| {
            if b.chars().count() > BODY_SNIPPET_CHARS {
                let truncated: String = b.chars().take(BODY_SNIPPET_CHARS).collect();
                format!("{}...", truncated)
            } else {
                b
            }
        });

        FetchError::Http {
            status,
            body_snippet,
        }
    }
}

/// Outcome of a paged fetch.
///
/// A failed page does not discard earlier pages: `records` holds everything
/// collected before the failure and `interrupted` carries the failure.
#[derive(Debug, Default)]
pub struct FetchedRecords {
    pub records: Vec<Value>,
    /// Number of pages successfully received
    pub pages: usize,
    pub interrupted: Option<FetchError>,
}

impl FetchedRecords {
    /// True when every requested page was received.
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch raw records.
    ///
    /// `None` pages through the whole collection. `Some(n)` fetches a single
    /// page of `n` records and stops.
    async fn fetch_all_records(&self, limit: Option<usize>) -> FetchedRecords;
}
