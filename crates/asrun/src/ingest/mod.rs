//! Resumable ingestion of as-run log files.
//!
//! Each run skips the lines already covered by the newest cursor snapshot,
//! turns every remaining line into a record (dispatching long clips to the
//! cut service), then commits the records and a new snapshot in one
//! transaction.

pub mod config;
pub mod report;
pub mod runner;

pub use config::IngestConfig;
pub use report::{IngestReport, SkippedLine};
pub use runner::{resume_offset, IngestPipeline};
