//! Cut service boundary: request/response types, the `CutService` trait and
//! the bounded-retry submit used by the ingestion pipeline.

pub mod client;
pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::record::LogFields;

pub use client::HttpCutService;
pub use error::{DispatchError, PollError};

/// Payload for `POST /api/v1/cutmedia`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutRequest {
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub path: String,
    /// `HH:MM:SS`, the first 8 characters of the raw duration.
    pub duration: String,
}

impl CutRequest {
    pub fn from_fields(fields: &LogFields, target_path: &str) -> Self {
        Self {
            start_time: fields.start_time.clone(),
            end_time: fields.end_time.clone(),
            title: fields.title.clone(),
            path: target_path.to_string(),
            duration: fields.duration_hms().to_string(),
        }
    }
}

/// Job state as reported by the cut service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Success,
    Failure,
    /// A value outside the known vocabulary. Treated as still running.
    Unknown(String),
}

impl JobState {
    /// Maps the service's free-form state string, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" | "COMPLETED" | "DONE" => JobState::Success,
            "FAILURE" | "FAILED" | "ERROR" | "REVOKED" | "CANCELLED" => JobState::Failure,
            "PENDING" | "QUEUED" | "RUNNING" | "STARTED" | "PROCESSING" | "RETRY" => {
                JobState::Pending
            }
            _ => JobState::Unknown(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

/// What a successful submit hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub initial_state: JobState,
}

/// The external cut service.
#[async_trait]
pub trait CutService: Send + Sync {
    /// Submits a cut job.
    async fn submit(&self, request: &CutRequest) -> Result<JobHandle, DispatchError>;

    /// Queries the state of a previously submitted job.
    async fn status(&self, job_id: &str) -> Result<JobState, PollError>;
}

/// Bounded exponential backoff for dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based): base, 2x base, 4x base and so on
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Submits `request`, retrying transient failures per `policy`.
pub async fn submit_with_retry(
    service: &dyn CutService,
    request: &CutRequest,
    policy: RetryPolicy,
) -> Result<JobHandle, DispatchError> {
    let mut attempt = 0;
    loop {
        match service.submit(request).await {
            Ok(handle) => return Ok(handle),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Cut submit failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
