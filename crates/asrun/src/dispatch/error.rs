//! Cut service error types.

use thiserror::Error;

/// Errors from submitting a cut job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// Connection refused, reset, DNS failure and similar.
    #[error("Cut service unreachable: {0}")]
    Network(String),

    /// The request exceeded its timeout.
    #[error("Cut request timed out: {0}")]
    Timeout(String),

    /// The service answered with a non-2xx status.
    #[error("Cut service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected `{state, job_id}` document.
    #[error("Malformed cut response: {0}")]
    MalformedResponse(String),
}

impl DispatchError {
    /// Returns true if this error is transient and the submit may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Network(_) | DispatchError::Timeout(_) => true,
            DispatchError::Status { status, .. } => *status >= 500 || *status == 429,
            DispatchError::Client(_) | DispatchError::MalformedResponse(_) => false,
        }
    }
}

/// Errors from querying a job's state. None of these are terminal for the job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Cut service unreachable: {0}")]
    Network(String),

    #[error("Status request timed out: {0}")]
    Timeout(String),

    #[error("Status endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed status response: {0}")]
    MalformedResponse(String),
}
