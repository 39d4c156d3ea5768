//! Shared test utilities for asrun integration tests.
//!
//! - `TestHarness` for an isolated watch directory and database
//! - `FakeCutService`, an in-process HTTP cut service
//! - Builders for config values and fixed-width as-run lines

pub mod builders;
pub mod fake_service;
pub mod harness;

pub use builders::*;
pub use fake_service::FakeCutService;
pub use harness::TestHarness;
