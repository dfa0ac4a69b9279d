// ── Cancellable delayed task ──
//
// A spawned task that waits `delay` and then runs a future. Cancelling
// during the wait drops the future unpolled; once the wait has elapsed the
// future runs to completion regardless.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a future scheduled with [`ScheduledTask::schedule`].
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawn `task` to run after `delay` on the current runtime.
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            task.await;
        });

        Self { cancel, handle }
    }

    /// Stop the task if it is still waiting. A task past its delay keeps
    /// running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the task has either run or been cancelled.
    pub async fn join(self) {
        // The task body never panics on its own; a JoinError here can only
        // come from runtime shutdown.
        let _ = self.handle.await;
    }
}
