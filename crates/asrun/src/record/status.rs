//! Record lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an ingested as-run record.
///
/// `NotSent`, `Success`, `DispatchFailed`, `Failed` and `Rejected` are terminal.
/// Only `Pending` is ever polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    /// Short clip, never sent to the cut service.
    NotSent,
    /// Dispatched, waiting for the cut service to finish.
    Pending,
    /// The cut service reported the job as done.
    Success,
    /// Dispatch failed after all retries; no job exists.
    DispatchFailed,
    /// The cut service reported the job as failed.
    Failed,
    /// The duration field could not be evaluated.
    Rejected,
}

impl MediaStatus {
    pub const ALL: [MediaStatus; 6] = [
        MediaStatus::NotSent,
        MediaStatus::Pending,
        MediaStatus::Success,
        MediaStatus::DispatchFailed,
        MediaStatus::Failed,
        MediaStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::NotSent => "NOT_SENT",
            MediaStatus::Pending => "PENDING",
            MediaStatus::Success => "SUCCESS",
            MediaStatus::DispatchFailed => "DISPATCH_FAILED",
            MediaStatus::Failed => "FAILED",
            MediaStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MediaStatus::Pending)
    }

    /// Whether a record in this status must carry a cut-service job id.
    pub fn carries_job_id(&self) -> bool {
        matches!(
            self,
            MediaStatus::Pending | MediaStatus::Success | MediaStatus::Failed
        )
    }

    /// Whether the reconcile loop may move a record from `self` to `next`.
    pub fn can_transition_to(&self, next: MediaStatus) -> bool {
        matches!(
            (self, next),
            (MediaStatus::Pending, MediaStatus::Success) | (MediaStatus::Pending, MediaStatus::Failed)
        )
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown media status '{}'", s))
    }
}

/// Routing decision for a freshly extracted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Duration at or below the threshold.
    Skip,
    /// Duration above the threshold; send to the cut service.
    Dispatch,
}

/// Clips strictly longer than `threshold_secs` are cut.
pub fn route(duration_secs: u32, threshold_secs: u32) -> Routing {
    if duration_secs > threshold_secs {
        Routing::Dispatch
    } else {
        Routing::Skip
    }
}
