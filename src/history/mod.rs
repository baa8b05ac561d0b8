//! Prior-run history: fetched once per invocation, folded per test identity.
//!
//! Fetching never fails from the caller's point of view. Transport errors and
//! malformed responses are logged and replaced by an empty history, so the
//! report degrades to "everything is new" instead of aborting.

pub mod file;
pub mod http;

use crate::parse::{RunSummary, Status};
use crate::results::{HistoricalDocument, ResultBlob, ResultDocument};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

pub use file::FileHistorySource;
pub use http::HttpHistorySource;

/// Number of prior statuses kept per test.
pub const HISTORY_WINDOW: usize = 10;

/// Prior statuses of one test, oldest first.
pub type HistoryRecord = Vec<Status>;

/// Test identity -> prior statuses.
pub type HistoryMap = BTreeMap<String, HistoryRecord>;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid history service URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("history service answered HTTP {status}")]
    Status { status: u16 },

    #[error("malformed history response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read history file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Where prior run documents come from.
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    /// Prior result documents for `key`, oldest first.
    async fn fetch(&self, key: &str) -> Result<Vec<ResultDocument>, HistoryError>;
}

/// Accepted response shapes: a bare list of blobs, or a historical document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    List(Vec<ResultBlob>),
    Wrapped(HistoricalDocument),
}

/// Decode a history payload into result documents, oldest first.
pub fn decode_response(body: &str) -> Result<Vec<ResultDocument>, HistoryError> {
    let blobs = match serde_json::from_str::<HistoryResponse>(body)? {
        HistoryResponse::List(blobs) => blobs,
        HistoryResponse::Wrapped(doc) => doc.results,
    };
    let docs = blobs
        .into_iter()
        .map(ResultBlob::decode)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

/// Read-only history snapshot plus the most recent run's counts.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    records: HistoryMap,
    last_counts: RunSummary,
}

impl HistoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch history for `key`, degrading to empty on any failure.
    pub async fn fetch(source: &dyn HistorySource, key: &str) -> Self {
        match source.fetch(key).await {
            Ok(docs) => {
                let store = Self::from_documents(docs);
                info!(
                    %key,
                    tests = store.records.len(),
                    "loaded run history"
                );
                store
            }
            Err(e) => {
                warn!(%key, error = %e, "history unavailable, treating every test as new");
                Self::empty()
            }
        }
    }

    /// Fold documents (oldest first) into per-test records, keeping the last
    /// [`HISTORY_WINDOW`] statuses of each test.
    pub fn from_documents(docs: impl IntoIterator<Item = ResultDocument>) -> Self {
        let mut records = HistoryMap::new();
        let mut last_counts = RunSummary::default();

        for doc in docs {
            last_counts = doc.summary();
            for entry in doc.results {
                let record = records.entry(entry.id).or_default();
                record.push(entry.status);
                if record.len() > HISTORY_WINDOW {
                    record.remove(0);
                }
            }
        }

        Self {
            records,
            last_counts,
        }
    }

    /// Prior statuses of `id`, empty if it never ran before.
    pub fn get(&self, id: &str) -> &[Status] {
        self.records.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Counts of the most recent prior run; zero without history.
    pub fn last_counts(&self) -> RunSummary {
        self.last_counts
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
