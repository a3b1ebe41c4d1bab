//! Background Expiry Sweeper
//!
//! Reads never evict: an expired entry is invisible to `get` but keeps
//! occupying the backend until something removes it. This module runs the
//! store's cleanup pass on a fixed interval as a Tokio task so that storage is
//! reclaimed even for keys nobody reads again.
//!
//! ## Design
//!
//! The sweeper:
//! 1. Sleeps for the configured interval
//! 2. Wakes up and runs one full cleanup pass over its namespace
//! 3. Logs how many entries were evicted
//!
//! The task is owned through an [`ExpirySweeper`] handle. Dropping the handle
//! (or calling [`ExpirySweeper::stop`]) ends the task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Something the sweeper can clean on a schedule.
pub trait Sweep: Send + Sync + 'static {
    /// Runs one cleanup pass and returns the number of evicted entries.
    fn sweep(&self) -> usize;

    /// A short label for log lines (the namespace, for stores).
    fn label(&self) -> &str;
}

/// A handle to a running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts sweeping `target` every `interval` on the current Tokio runtime.
    ///
    /// Returns `None` when called outside a runtime, in which case nothing is
    /// scheduled.
    pub fn start<S: Sweep>(target: Arc<S>, interval: Duration) -> Option<Self> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            target_label = target.label(),
            interval_secs = interval.as_secs_f64(),
            "Background expiry sweeper started"
        );

        handle.spawn(sweeper_loop(target, interval, shutdown_rx));

        Some(Self { shutdown_tx })
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("Background expiry sweeper stopped");
        }
    }

    /// Returns true while the sweeper task is still listening.
    pub fn is_running(&self) -> bool {
        !self.shutdown_tx.is_closed() && !*self.shutdown_tx.borrow()
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop<S: Sweep>(
    target: Arc<S>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!(target_label = target.label(), "Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let expired = target.sweep();

        if expired > 0 {
            debug!(
                target_label = target.label(),
                expired = expired,
                "Expired entries cleaned up"
            );
        } else {
            trace!(target_label = target.label(), "Sweep found nothing to evict");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSweep {
        runs: AtomicUsize,
    }

    impl Sweep for CountingSweep {
        fn sweep(&self) -> usize {
            self.runs.fetch_add(1, Ordering::SeqCst);
            0
        }

        fn label(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_no_runtime_no_sweeper() {
        let target = Arc::new(CountingSweep::default());
        assert!(ExpirySweeper::start(target, Duration::from_secs(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_interval() {
        let target = Arc::new(CountingSweep::default());
        let sweeper = ExpirySweeper::start(Arc::clone(&target), Duration::from_secs(15)).unwrap();
        assert!(sweeper.is_running());

        // Nothing runs before the first interval elapses
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(target.runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(target.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_drop() {
        let target = Arc::new(CountingSweep::default());

        {
            let _sweeper =
                ExpirySweeper::start(Arc::clone(&target), Duration::from_secs(1)).unwrap();
            tokio::time::sleep(Duration::from_millis(2500)).await;
            // Sweeper is dropped here
        }

        let runs = target.runs.load(Ordering::SeqCst);
        assert_eq!(runs, 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(target.runs.load(Ordering::SeqCst), runs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_stop() {
        let target = Arc::new(CountingSweep::default());
        let sweeper = ExpirySweeper::start(Arc::clone(&target), Duration::from_secs(1)).unwrap();

        sweeper.stop();
        assert!(!sweeper.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(target.runs.load(Ordering::SeqCst), 0);
    }
}
