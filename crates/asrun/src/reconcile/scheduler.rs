//! Self-terminating reconcile loop.
//!
//! The loop ticks on a fixed interval while any record is `PENDING` and exits
//! once none remain. Ingestion calls [`ReconcileScheduler::ensure_running`]
//! after every run, which starts a new loop only if none is active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use super::reconciler::Reconciler;

pub struct ReconcileScheduler {
    reconciler: Arc<Reconciler>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReconcileScheduler {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            reconciler,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Whether a loop is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts the loop unless one is already active or shutdown was requested.
    /// Returns `true` if a new loop was spawned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ensure_running(&self) -> bool {
        if *self.shutdown_tx.borrow() {
            return false;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        log::info!(
            "Starting reconcile loop (interval {}ms)",
            self.interval.as_millis()
        );

        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.reconciler),
            self.interval,
            Arc::clone(&self.running),
            self.shutdown_tx.subscribe(),
        ));

        let mut slot = self.handle.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(handle);
        true
    }

    /// Signals the loop to stop and waits for it to exit. Later calls to
    /// `ensure_running` do nothing.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("Reconcile loop task failed: {}", e);
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

async fn run_loop(
    reconciler: Arc<Reconciler>,
    interval: Duration,
    running: Arc<AtomicBool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick fires immediately.
        let mut closed = false;
        tokio::select! {
            _ = timer.tick() => {},
            changed = shutdown_rx.changed() => closed = changed.is_err(),
        }

        if closed || *shutdown_rx.borrow() {
            log::info!("Reconcile loop shutting down");
            running.store(false, Ordering::Release);
            return;
        }

        if let Err(e) = reconciler
            .tick()
            .instrument(tracing::info_span!("reconcile_tick"))
            .await
        {
            log::error!("Reconcile tick failed: {}", e);
            continue;
        }

        match reconciler.pending_count() {
            Ok(0) => {
                running.store(false, Ordering::Release);

                // Work may have arrived after the count but before the flag
                // cleared, in which case nobody else started a loop.
                let resumed = matches!(reconciler.pending_count(), Ok(n) if n > 0)
                    && running
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok();
                if !resumed {
                    log::info!("No pending jobs left, reconcile loop stopped");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("Failed to count pending jobs: {}", e),
        }
    }
}
