use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use domain::{
    model::entity::{JobDescriptor, TailOptions},
    service::LogSink,
};
use infrastructure::sync::UpdateLock;

use crate::error::PollerError;
use crate::job_status::JobStatusPoller;
use crate::log_tailer::LogTailer;

/// Status and stdout/stderr logs of the selected job.
///
/// Pollers only run while the page is visible and a job is selected.
pub struct JobMonitor {
    status: JobStatusPoller,
    stdout: LogTailer,
    stderr: LogTailer,
    view: Mutex<PageView>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PageView {
    visible: bool,
    job_selected: bool,
}

impl JobMonitor {
    pub fn new(status: JobStatusPoller, stdout: LogTailer, stderr: LogTailer) -> Self {
        Self {
            status,
            stdout,
            stderr,
            view: Mutex::default(),
        }
    }

    pub fn status(&self) -> &JobStatusPoller {
        &self.status
    }

    pub fn stdout(&self) -> &LogTailer {
        &self.stdout
    }

    pub fn stderr(&self) -> &LogTailer {
        &self.stderr
    }

    pub async fn select_job(&self, job: JobDescriptor) {
        self.stdout.set_log_file(job.meta_script_log()).await;
        self.stderr.set_log_file(job.meta_script_err()).await;
        self.status.assign_job(job).await;

        let visible = {
            let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
            view.job_selected = true;
            view.visible
        };
        if visible {
            self.status.start_update();
            self.stdout.start_update();
            self.stderr.start_update();
        }
    }

    pub async fn kill_job(&self) -> Result<(), PollerError> {
        self.status.kill_job().await
    }

    /// The page became visible.
    pub fn start_update(&self) {
        let view = {
            let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
            view.visible = true;
            *view
        };
        if view.job_selected {
            self.status.start_update();
            self.stdout.start_update();
            self.stderr.start_update();
        }
    }

    /// The page was hidden.
    pub fn stop_update(&self) {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).visible = false;
        self.pause_all();
    }

    /// Drop the selected job.
    pub async fn reset(&self) {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).job_selected = false;
        self.stdout.stop_update();
        self.stderr.stop_update();
        self.status.reset().await;
    }

    pub async fn finalize(&self) {
        tokio::join!(self.status.finalize(), self.stdout.finalize(), self.stderr.finalize());
    }

    fn pause_all(&self) {
        self.status.stop_update();
        self.stdout.stop_update();
        self.stderr.stop_update();
    }
}

/// Beginning of the cluster load ("top") log.
pub struct ClusterLoadMonitor {
    top: LogTailer,
}

impl ClusterLoadMonitor {
    pub fn new(
        top_log_file: impl Into<PathBuf>,
        sink: Arc<dyn LogSink>,
        update_lock: UpdateLock,
        max_bytes: usize,
        update_interval: Duration,
    ) -> Self {
        let options = TailOptions::builder()
            .max_bytes(max_bytes)
            .show_end(false)
            .update_interval(update_interval)
            .build();
        Self {
            top: LogTailer::new(top_log_file, sink, update_lock, options),
        }
    }

    pub fn tailer(&self) -> &LogTailer {
        &self.top
    }

    pub fn start_update(&self) {
        self.top.start_update();
    }

    pub fn stop_update(&self) {
        self.top.stop_update();
    }

    pub async fn finalize(&self) {
        self.top.finalize().await;
    }
}
