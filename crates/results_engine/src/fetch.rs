use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use results_core::PollKey;
use serde_json::{json, Value};

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Backend root; `/results/{jobId}` is appended.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Source of raw results payloads for a job/persona pair.
#[async_trait::async_trait]
pub trait ResultsFetcher: Send + Sync {
    /// Returns the decoded JSON body; interpretation is left to the normalizer.
    async fn fetch(&self, key: &PollKey) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// `GET {base}/results/{jobId}?persona={persona}`.
    pub fn results_url(&self, key: &PollKey) -> Result<url::Url, FetchError> {
        let mut url = url::Url::parse(&self.settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::new(FailureKind::InvalidUrl, "base url cannot have a path"))?
            .pop_if_empty()
            .extend(["results", key.job_id.as_str()]);
        url.query_pairs_mut()
            .append_pair("persona", key.persona.as_str());
        Ok(url)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ResultsFetcher for ReqwestFetcher {
    async fn fetch(&self, key: &PollKey) -> Result<Value, FetchError> {
        let url = self.results_url(key)?;
        engine_trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::new(FailureKind::NotFound, status.to_string()));
        }

        let bytes = self.read_body(response).await?;
        engine_debug!("{} answered {} with {} bytes", key, status, bytes.len());

        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                error_message(&bytes).unwrap_or_else(|| status.to_string()),
            ));
        }

        // 202 means the job is accepted but unfinished, whatever the body says.
        if status == StatusCode::ACCEPTED {
            return Ok(json!({ "status": "processing" }));
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(FetchError::new(FailureKind::InvalidBody, "empty response body"));
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::InvalidBody, err.to_string()))
    }
}

/// Error bodies carry a human-readable `error` field.
fn error_message(bytes: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    body.get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
