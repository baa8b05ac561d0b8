use super::{decode_response, HistoryError, HistorySource};
use crate::results::ResultDocument;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::debug;

/// History service client: `GET {base_url}/v1/results/{key}`.
pub struct HttpHistorySource {
    client: Client,
    base_url: Url,
}

impl HttpHistorySource {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, HistoryError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|e| HistoryError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(HistoryError::InvalidUrl {
                url: raw.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// The key is pushed as a single percent-encoded path segment.
    pub fn url_for(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1", "results", key]);
        }
        url
    }
}

#[async_trait::async_trait]
impl HistorySource for HttpHistorySource {
    async fn fetch(&self, key: &str) -> Result<Vec<ResultDocument>, HistoryError> {
        let url = self.url_for(key);
        let start = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        debug!(%url, status = status.as_u16(), elapsed_ms = start.elapsed().as_millis() as u64, "history response");

        if !status.is_success() {
            return Err(HistoryError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        decode_response(&body)
    }
}
