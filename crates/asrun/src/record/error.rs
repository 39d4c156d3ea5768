use thiserror::Error;

/// A fixed-width field could not be decoded as text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}' (bytes {start}..{end}) is not valid UTF-8: {reason}")]
pub struct ParseError {
    pub field: &'static str,
    pub start: usize,
    pub end: usize,
    pub reason: String,
}

/// A duration string is not of the form `HH:MM:SS`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("duration '{value}' does not match HH:MM:SS")]
    Pattern { value: String },

    #[error("duration '{value}' has {component} out of range")]
    OutOfRange {
        value: String,
        component: &'static str,
    },
}
