//! Result documents: the JSON artifact a run produces, and the historical
//! variant that bundles several of them.

pub mod hints;

use crate::parse::{RunAssembler, RunSummary, Status, TestOutcome};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed result document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One test entry of a result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub id: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Per-run result document: `{"results": [{id, status, summary?}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub results: Vec<ResultEntry>,
}

impl ResultDocument {
    pub fn from_run(run: &RunAssembler) -> Self {
        let results = run
            .outcomes()
            .iter()
            .map(|o| ResultEntry {
                id: o.identity.clone(),
                status: o.status,
                summary: (!o.message.is_empty()).then(|| o.message.clone()),
            })
            .collect();
        Self { results }
    }

    /// Rebuild a run from a document. Durations and raw segments are not
    /// part of the document and come back empty.
    pub fn into_run(self) -> RunAssembler {
        self.results
            .into_iter()
            .map(|entry| {
                let mut outcome = TestOutcome::new(entry.id, entry.status);
                if entry.status == Status::Fail {
                    outcome.message = entry.summary.unwrap_or_default();
                }
                outcome
            })
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_statuses(self.results.iter().map(|e| e.status))
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        write_json(path, self)?;
        info!(path = %path.display(), tests = self.results.len(), "wrote result document");
        Ok(())
    }
}

/// A prior run inside a historical document: either the serialized text of a
/// result document or the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultBlob {
    Text(String),
    Document(ResultDocument),
}

impl ResultBlob {
    pub fn decode(self) -> Result<ResultDocument, serde_json::Error> {
        match self {
            ResultBlob::Text(text) => serde_json::from_str(&text),
            ResultBlob::Document(doc) => Ok(doc),
        }
    }
}

/// Historical variant: `{"results": ["<result document>", ...]}`, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalDocument {
    pub results: Vec<ResultBlob>,
}

impl HistoricalDocument {
    /// Bundle documents, oldest first, each serialized to text.
    pub fn bundle<'a>(
        docs: impl IntoIterator<Item = &'a ResultDocument>,
    ) -> Result<Self, serde_json::Error> {
        let results = docs
            .into_iter()
            .map(|doc| serde_json::to_string(doc).map(ResultBlob::Text))
            .collect::<Result<_, _>>()?;
        Ok(Self { results })
    }

    /// Decode every blob. Any malformed blob fails the whole document.
    pub fn decode(self) -> Result<Vec<ResultDocument>, serde_json::Error> {
        self.results.into_iter().map(ResultBlob::decode).collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        write_json(path, self)?;
        info!(path = %path.display(), runs = self.results.len(), "wrote historical document");
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DocumentError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| DocumentError::Write {
        path: path.display().to_string(),
        source,
    })
}
