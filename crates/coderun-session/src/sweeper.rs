//! Background expiry of finished sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use coderun_core::SessionSettings;

use crate::store::SessionStore;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Waiting sessions finished for being idle too long
    pub idle_finished: usize,
    /// Finished sessions removed from the store
    pub removed: usize,
}

/// Removes sessions once they have been finished for the grace period.
///
/// Sessions waiting for input are left alone unless an idle timeout is
/// configured, in which case they are finished after idling that long and
/// then expire like any other finished session.
#[derive(Debug)]
pub struct ExpirySweeper {
    store: Arc<SessionStore>,
    grace_period: Duration,
    idle_timeout: Option<Duration>,
    interval: Duration,
}

impl ExpirySweeper {
    /// Create a sweeper over `store`.
    pub fn new(
        store: Arc<SessionStore>,
        grace_period: Duration,
        idle_timeout: Option<Duration>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            grace_period,
            idle_timeout,
            interval,
        }
    }

    /// Create a sweeper from session settings.
    pub fn from_settings(store: Arc<SessionStore>, settings: &SessionSettings) -> Self {
        Self::new(
            store,
            settings.grace_period(),
            settings.idle_timeout(),
            settings.sweep_interval(),
        )
    }

    /// Grace period between finishing and removal.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Run one sweep now.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    /// Run one sweep as if the current time were `now`.
    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();

        if let Some(timeout) = self.idle_timeout {
            for id in self.store.list_idle(now, timeout) {
                // The session may have taken input since it was listed
                let finished = self
                    .store
                    .mutate(&id, |s| Ok(s.is_idle(now, timeout) && s.force_finish(now)))
                    .unwrap_or(false);
                if finished {
                    info!("Idle session finished: id={}", id);
                    report.idle_finished += 1;
                }
            }
        }

        for id in self.store.list_expirable(now, self.grace_period) {
            if self.store.remove(&id) {
                report.removed += 1;
            }
        }

        if report != SweepReport::default() {
            debug!(
                "Sweep: {} idle finished, {} removed, {} live",
                report.idle_finished,
                report.removed,
                self.store.len()
            );
        }
        report
    }

    /// Run the sweeper on a background task until the handle is shut down
    /// or dropped.
    pub fn spawn(self: Arc<Self>) -> SweeperHandle {
        let period = self.interval.max(Duration::from_millis(1));
        info!(
            "Starting expiry sweeper: interval={:?}, grace={:?}, idle_timeout={:?}",
            period, self.grace_period, self.idle_timeout
        );

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep();
            }
        });

        SweeperHandle { task }
    }
}

/// Handle to a running sweeper task. Dropping it stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for its task to wind down.
    pub async fn shutdown(mut self) {
        self.task.abort();
        // A cancelled JoinError is the expected outcome
        let _ = (&mut self.task).await;
        debug!("Expiry sweeper stopped");
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
