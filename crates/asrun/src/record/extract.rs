//! Fixed-width field extraction for as-run log lines.
//!
//! Offsets are byte offsets into the raw line. A line shorter than a field
//! yields a truncated or empty value rather than an error; only bytes that are
//! not valid UTF-8 are rejected.

use std::ops::Range;

use super::error::ParseError;

pub const START_TIME: Range<usize> = 6..28;
pub const END_TIME: Range<usize> = 29..51;
pub const TITLE: Range<usize> = 106..138;
pub const DURATION: Range<usize> = 184..195;
pub const RECONCILE_KEY: Range<usize> = 279..344;

/// The five fields of interest in an as-run line, untrimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFields {
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub duration: String,
    pub reconcile_key: String,
}

impl LogFields {
    /// The `HH:MM:SS` prefix of the duration field (first 8 characters).
    pub fn duration_hms(&self) -> &str {
        match self.duration.char_indices().nth(8) {
            Some((idx, _)) => &self.duration[..idx],
            None => &self.duration,
        }
    }
}

/// Extracts all fields from a raw line. The line terminator, if any, is ignored.
pub fn extract_fields(line: &[u8]) -> Result<LogFields, ParseError> {
    let line = strip_line_terminator(line);
    Ok(LogFields {
        start_time: slice_field(line, "start_time", START_TIME)?,
        end_time: slice_field(line, "end_time", END_TIME)?,
        title: slice_field(line, "title", TITLE)?,
        duration: slice_field(line, "duration", DURATION)?,
        reconcile_key: slice_field(line, "reconcile_key", RECONCILE_KEY)?,
    })
}

/// Removes a trailing `\n` or `\r\n`.
pub fn strip_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn slice_field(line: &[u8], field: &'static str, range: Range<usize>) -> Result<String, ParseError> {
    let start = range.start.min(line.len());
    let end = range.end.min(line.len());
    let bytes = &line[start..end];

    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ParseError {
            field,
            start: range.start,
            end: range.end,
            reason: e.to_string(),
        })
}
