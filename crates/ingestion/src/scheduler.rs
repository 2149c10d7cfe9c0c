//! Completion-relative periodic scheduling.
//!
//! The delay before the next run starts when the previous run finishes, so a
//! task never overlaps itself. A shutdown signal stops future runs; a run in
//! progress is not interrupted and must bound its own blocking work.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Work executed on a schedule.
#[async_trait]
pub trait PeriodicTask: Send {
    fn name(&self) -> &str;

    /// Run once. Failures are handled by the task itself.
    async fn run_once(&mut self);
}

/// Run `task` now and then `delay` after every completed run, until
/// `shutdown` fires or its sender is dropped.
///
/// Returns the number of runs.
pub async fn run_periodic<T: PeriodicTask + ?Sized>(
    task: &mut T,
    delay: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> u64 {
    let mut runs = 0;
    loop {
        task.run_once().await;
        runs += 1;

        tokio::select! {
            _ = shutdown.recv() => {
                info!(task = task.name(), runs, "Stopping scheduled task");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
    runs
}
