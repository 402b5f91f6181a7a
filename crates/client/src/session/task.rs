//! Cancellable scheduled tasks.

use std::future::Future;

use tokio::task::JoinHandle;

/// Handle to a spawned timer task with a single owner.
///
/// The task is aborted when the handle is cancelled or dropped, so
/// re-arming a prompt slot replaces the pending timer instead of leaking
/// it, and tearing down the owner tears down its timers.
#[derive(Debug)]
pub(crate) struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawn `future` onto the runtime and keep the abort handle.
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Stop the task without waiting for it.
    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_runs_its_body() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let task = ScheduledTask::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.store(true, Ordering::SeqCst);
        });
        task.cancel();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_aborts_the_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        drop(ScheduledTask::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.store(true, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
