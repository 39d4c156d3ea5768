//! HTTP client for the external cut service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::Value;

use super::error::{DispatchError, PollError};
use super::{CutRequest, CutService, JobHandle, JobState};
use crate::config::CutServiceConfig;

/// Maximum length for error bodies carried in errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

const SUBMIT_PATH: &str = "/api/v1/cutmedia";
const STATUS_SEGMENTS: [&str; 3] = ["api", "v1", "status"];

fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    state: String,
    job_id: Value,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: String,
}

/// `CutService` over HTTP/JSON.
pub struct HttpCutService {
    client: Client,
    base_url: String,
    base: Url,
}

impl HttpCutService {
    /// Builds a client with the configured connect and request timeouts.
    pub fn new(config: &CutServiceConfig) -> Result<Self, DispatchError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| DispatchError::Client(format!("invalid base_url '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(DispatchError::Client(format!(
                "base_url '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn submit_url(&self) -> String {
        format!("{}{}", self.base_url, SUBMIT_PATH)
    }

    /// Job ids come from the service and are percent-encoded as one segment.
    fn status_url(&self, job_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(STATUS_SEGMENTS).push(job_id);
        }
        url
    }
}

/// Reads the body and splits non-2xx responses out as `(status, body)`.
async fn read_body(response: Response) -> Result<Result<String, (u16, String)>, reqwest::Error> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(Ok(body))
    } else {
        Ok(Err((status.as_u16(), truncate_body(&body))))
    }
}

fn dispatch_transport_error(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::Timeout(e.to_string())
    } else {
        DispatchError::Network(e.to_string())
    }
}

fn poll_transport_error(e: reqwest::Error) -> PollError {
    if e.is_timeout() {
        PollError::Timeout(e.to_string())
    } else {
        PollError::Network(e.to_string())
    }
}

/// Job ids come back as strings or numbers depending on the service build.
fn job_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl CutService for HttpCutService {
    async fn submit(&self, request: &CutRequest) -> Result<JobHandle, DispatchError> {
        let response = self
            .client
            .post(self.submit_url())
            .json(request)
            .send()
            .await
            .map_err(dispatch_transport_error)?;

        let body = read_body(response)
            .await
            .map_err(dispatch_transport_error)?
            .map_err(|(status, body)| DispatchError::Status { status, body })?;

        let parsed: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| DispatchError::MalformedResponse(format!("{}: {}", e, truncate_body(&body))))?;

        let job_id = job_id_from_value(&parsed.job_id).ok_or_else(|| {
            DispatchError::MalformedResponse(format!("missing job_id in {}", truncate_body(&body)))
        })?;

        tracing::debug!(job_id = %job_id, state = %parsed.state, "Cut job submitted");

        Ok(JobHandle {
            job_id,
            initial_state: JobState::parse(&parsed.state),
        })
    }

    async fn status(&self, job_id: &str) -> Result<JobState, PollError> {
        let response = self
            .client
            .get(self.status_url(job_id))
            .send()
            .await
            .map_err(poll_transport_error)?;

        let body = read_body(response)
            .await
            .map_err(poll_transport_error)?
            .map_err(|(status, body)| PollError::Status { status, body })?;

        let parsed: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| PollError::MalformedResponse(format!("{}: {}", e, truncate_body(&body))))?;

        Ok(JobState::parse(&parsed.state))
    }
}
