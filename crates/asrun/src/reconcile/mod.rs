//! Reconciliation: drive `PENDING` records to a terminal state by polling the
//! cut service.

pub mod reconciler;
pub mod scheduler;

pub use reconciler::{Reconciler, TickReport};
pub use scheduler::ReconcileScheduler;
