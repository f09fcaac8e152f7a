use std::future::Future;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No task exists
    Stopped,
    /// The task keeps waking up every interval but skips the cycle
    Paused,
    Running,
}

/// A single background task driving a periodic cycle.
///
/// The task is spawned by the first [`Worker::start`] and lives until
/// [`Worker::stop`] or until the worker is dropped. Pausing never tears it down.
#[derive(Debug)]
pub struct Worker {
    interval: Duration,
    active: Arc<AtomicBool>,
    task: Mutex<Option<Task>>,
}

#[derive(Debug)]
struct Task {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    wake: Arc<Notify>,
}

impl Worker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: Arc::default(),
            task: Mutex::default(),
        }
    }

    pub fn state(&self) -> WorkerState {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        match task.as_ref() {
            Some(task) if !task.handle.is_finished() => match self.active.load(Ordering::Acquire) {
                true => WorkerState::Running,
                false => WorkerState::Paused,
            },
            _ => WorkerState::Stopped,
        }
    }

    /// Switch to [`WorkerState::Running`].
    ///
    /// Spawns the task if there is none. A paused worker runs a cycle right
    /// away; starting a running worker does nothing.
    ///
    /// # Panics
    ///
    /// When called outside of a tokio runtime and no task exists yet.
    pub fn start<F, Fut>(&self, mut body: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        let was_active = self.active.swap(true, Ordering::AcqRel);

        if let Some(task) = task.as_ref().filter(|task| !task.handle.is_finished()) {
            if !was_active {
                task.wake.notify_one();
            }
            return;
        }

        let cancel = CancellationToken::new();
        let wake = Arc::new(Notify::new());
        let active = self.active.clone();
        let interval = self.interval;
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            let wake = wake.clone();
            async move {
                timer::new::<(), _, _>(interval, &wake, &cancel, || {
                    let cycle = active.load(Ordering::Acquire).then(&mut body);
                    async move {
                        if let Some(cycle) = cycle {
                            cycle.await;
                        }
                        ControlFlow::Continue(())
                    }
                })
                .await;
            }
        });
        tracing::debug!(?interval, "Worker spawned");

        *task = Some(Task {
            handle,
            cancel,
            wake,
        });
    }

    /// Switch to [`WorkerState::Paused`]; takes effect before the next cycle.
    pub fn pause(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Tear the task down, waiting for an in-flight cycle to finish.
    pub async fn stop(&self) {
        self.active.store(false, Ordering::Release);
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(Task { handle, cancel, .. }) = task else {
            return;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            if e.is_panic() {
                tracing::error!("Worker task panicked: {e}");
            }
        }
        tracing::debug!("Worker stopped");
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}
