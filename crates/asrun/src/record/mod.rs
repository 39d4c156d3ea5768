//! As-run record model: field extraction, duration evaluation and lifecycle.

pub mod duration;
pub mod error;
pub mod extract;
pub mod status;

pub use duration::duration_in_seconds;
pub use error::{FormatError, ParseError};
pub use extract::{extract_fields, LogFields};
pub use status::{route, MediaStatus, Routing};
