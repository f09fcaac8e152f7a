use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use domain::{
    model::{
        entity::{JobDescriptor, JobStatus},
        vo::StatusView,
    },
    service::{ClusterScripts, StatusSink},
};
use infrastructure::sync::{SessionCell, UpdateLock, Worker, WorkerState};

use crate::error::PollerError;

/// Tracks the state of one cluster job by polling the cluster scripts.
pub struct JobStatusPoller {
    inner: Arc<Inner>,
    worker: Worker,
}

struct Inner {
    cell: SessionCell<Tracked>,
    /// Bumped whenever the tracked job is replaced or cleared, so that a cycle
    /// computed for the previous job never reaches the sink.
    generation: AtomicU64,
    scripts: Arc<dyn ClusterScripts>,
    sink: Arc<dyn StatusSink>,
    current_user: String,
}

#[derive(Default)]
struct Tracked {
    job: Option<JobDescriptor>,
    published: JobStatus,
}

impl JobStatusPoller {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(
        scripts: Arc<dyn ClusterScripts>,
        sink: Arc<dyn StatusSink>,
        update_lock: UpdateLock,
        current_user: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cell: SessionCell::new(Tracked::default(), update_lock),
                generation: AtomicU64::new(0),
                scripts,
                sink,
                current_user: current_user.into(),
            }),
            worker: Worker::new(interval),
        }
    }

    /// Replace the tracked job and start polling it.
    pub async fn set_job(&self, job: JobDescriptor) {
        self.assign_job(job).await;
        self.start_update();
    }

    /// Replace the tracked job without touching the worker.
    pub async fn assign_job(&self, job: JobDescriptor) {
        tracing::info!(job_id = %job.job_id, owner = %job.owner_user_name, "Tracking job");
        let mut tracked = self.inner.cell.lock().await;
        tracked.job = Some(job);
        tracked.published = JobStatus::Unset;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner
            .cell
            .publish(tracked, || {
                self.inner.sink.render_status(&StatusView::determining())
            })
            .await;
    }

    /// Forget the tracked job and clear the display. The worker is only paused.
    pub async fn reset(&self) {
        self.worker.pause();
        let mut tracked = self.inner.cell.lock().await;
        tracked.job = None;
        tracked.published = JobStatus::Unset;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner
            .cell
            .publish(tracked, || self.inner.sink.render_status(&StatusView::blank()))
            .await;
    }

    pub fn start_update(&self) {
        let inner = self.inner.clone();
        self.worker.start(move || {
            let inner = inner.clone();
            async move { inner.poll().await }
        });
    }

    pub fn stop_update(&self) {
        self.worker.pause();
    }

    /// Stop polling for good, waiting for an in-flight cycle to finish.
    pub async fn finalize(&self) {
        self.worker.stop().await;
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    /// The status last pushed to the sink.
    pub async fn status(&self) -> JobStatus {
        self.inner.cell.lock().await.published
    }

    /// Cancel the tracked job.
    ///
    /// Only the owner may kill a queued or running job. The kill control is
    /// disabled once the kill script has been run, whatever its outcome; the
    /// next cycle shows what actually happened.
    pub async fn kill_job(&self) -> Result<(), PollerError> {
        let tracked = self.inner.cell.lock().await;
        let job = tracked.job.clone().filter(JobDescriptor::is_trackable).ok_or(PollerError::NoJob)?;
        let permitted = job.is_owned_by(&self.inner.current_user) && tracked.published.is_killable();
        drop(tracked);

        if !permitted {
            return Err(PollerError::NotPermitted {
                user: self.inner.current_user.clone(),
                job_id: job.job_id,
            });
        }

        tracing::info!(job_id = %job.job_id, user = %self.inner.current_user, "Killing job");
        let result = self.inner.scripts.kill(&job.job_id).await.map_err(|e| PollerError::Kill {
            job_id: job.job_id.clone(),
            reason: format!("{e:#}"),
        });
        if let Err(e) = &result {
            tracing::warn!(job_id = %job.job_id, "{e}");
        }

        self.inner.cell.publish_with(|| self.inner.sink.set_kill_enabled(false)).await;
        // The next cycle renders whatever the job is now, kill control included.
        self.inner.cell.lock().await.published = JobStatus::Unset;
        result
    }
}

impl Inner {
    async fn poll(&self) {
        let mut tracked = self.cell.lock().await;
        let Some(job) = tracked.job.as_ref().filter(|job| job.is_trackable()) else {
            return;
        };

        let status = self.determine(job).await;
        if status == tracked.published {
            return;
        }

        tracing::info!(job_id = %job.job_id, from = %tracked.published, to = %status, "Job status changed");
        let view = StatusView::of(status, job.is_owned_by(&self.current_user));
        tracked.published = status;
        let generation = self.generation.load(Ordering::Acquire);

        self.cell
            .publish(tracked, || {
                if self.generation.load(Ordering::Acquire) == generation {
                    self.sink.render_status(&view);
                }
            })
            .await;
    }

    async fn determine(&self, job: &JobDescriptor) -> JobStatus {
        let output = self.scripts.query_status(&job.job_id).await.unwrap_or_else(|e| {
            tracing::warn!(job_id = %job.job_id, "Status query failed: {e:#}");
            String::new()
        });

        match JobStatus::classify(&output) {
            JobStatus::Unknown => self.inspect_meta_log(job).await,
            status => status,
        }
    }

    /// The scheduler no longer (or not yet) knows the job: the meta-script log
    /// tells whether it ran and how it ended.
    async fn inspect_meta_log(&self, job: &JobDescriptor) -> JobStatus {
        let log = job.meta_script_log();
        if !tokio::fs::try_exists(&log).await.unwrap_or(false) {
            return JobStatus::Waiting;
        }

        match self.scripts.completion_code(&log).await {
            Ok(code) => JobStatus::from_completion_code(&code),
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, log = %log.display(), "Cannot read return code: {e:#}");
                JobStatus::CompletedFailure
            }
        }
    }
}
