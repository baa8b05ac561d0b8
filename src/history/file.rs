use super::{decode_response, HistoryError, HistorySource};
use crate::results::ResultDocument;
use std::path::PathBuf;

/// Offline history: a historical document (or bare blob list) on disk. The
/// key is ignored.
pub struct FileHistorySource {
    path: PathBuf,
}

impl FileHistorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl HistorySource for FileHistorySource {
    async fn fetch(&self, _key: &str) -> Result<Vec<ResultDocument>, HistoryError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| HistoryError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        decode_response(&body)
    }
}
