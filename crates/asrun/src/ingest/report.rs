use serde::Serialize;

use crate::record::MediaStatus;

/// A line that produced no record because a field was not valid text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLine {
    pub line_number: u64,
    pub reason: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub filename: String,
    /// Lines `1..=resume_after` were skipped as already processed (or header).
    pub resume_after: u64,
    /// Lines counted in the file during this run.
    pub total_lines: u64,
    /// Value written to the new cursor snapshot.
    pub cursor_total_lines: u64,
    pub not_sent: usize,
    pub pending: usize,
    pub dispatch_failed: usize,
    pub rejected: usize,
    pub blank_lines: usize,
    pub skipped: Vec<SkippedLine>,
}

impl IngestReport {
    pub fn new(filename: impl Into<String>, resume_after: u64) -> Self {
        Self {
            filename: filename.into(),
            resume_after,
            ..Self::default()
        }
    }

    pub fn records_created(&self) -> usize {
        self.not_sent + self.pending + self.dispatch_failed + self.rejected
    }

    pub(crate) fn count(&mut self, status: MediaStatus) {
        match status {
            MediaStatus::NotSent => self.not_sent += 1,
            MediaStatus::Pending => self.pending += 1,
            MediaStatus::DispatchFailed => self.dispatch_failed += 1,
            MediaStatus::Rejected => self.rejected += 1,
            // Never produced at ingest time.
            MediaStatus::Success | MediaStatus::Failed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_created_sums_statuses() {
        let mut report = IngestReport::new("asrun.txt", 8);
        report.count(MediaStatus::NotSent);
        report.count(MediaStatus::Pending);
        report.count(MediaStatus::Pending);
        report.count(MediaStatus::Rejected);
        report.blank_lines = 5;

        assert_eq!(report.records_created(), 4);
        assert_eq!(report.pending, 2);
        assert_eq!(report.resume_after, 8);
    }

    #[test]
    fn test_serializes_camel_case() {
        let report = IngestReport::new("asrun.txt", 0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["resumeAfter"], 0);
        assert_eq!(json["cursorTotalLines"], 0);
    }
}
