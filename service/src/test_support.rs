use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use domain::model::vo::StatusView;
use domain::service::{ClusterScripts, LogSink, StatusSink};
use infrastructure::sync::UpdateLock;

mockall::mock! {
    pub Scripts {}

    #[async_trait::async_trait]
    impl ClusterScripts for Scripts {
        async fn query_status(&self, job_id: &str) -> anyhow::Result<String>;
        async fn kill(&self, job_id: &str) -> anyhow::Result<()>;
        async fn completion_code(&self, meta_script_log: &Path) -> anyhow::Result<String>;
    }
}

/// Records everything rendered, and whether it happened under the update lock.
pub struct RecordingStatusSink {
    lock: UpdateLock,
    views: Mutex<Vec<StatusView>>,
    kill_enabled: Mutex<Vec<bool>>,
    unlocked: AtomicBool,
}

pub struct RecordingLogSink {
    lock: UpdateLock,
    logs: Mutex<Vec<(String, bool)>>,
    unlocked: AtomicBool,
}

impl RecordingStatusSink {
    pub fn new(lock: &UpdateLock) -> Self {
        Self {
            lock: lock.clone(),
            views: Mutex::default(),
            kill_enabled: Mutex::default(),
            unlocked: AtomicBool::new(false),
        }
    }

    pub fn views(&self) -> Vec<StatusView> {
        self.views.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.views().into_iter().map(|view| view.label).collect()
    }

    pub fn kill_toggles(&self) -> Vec<bool> {
        self.kill_enabled.lock().unwrap().clone()
    }

    pub fn rendered_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    fn check_lock(&self) {
        if !self.lock.is_held() {
            self.unlocked.store(true, Ordering::SeqCst);
        }
    }
}

impl StatusSink for RecordingStatusSink {
    fn render_status(&self, view: &StatusView) {
        self.check_lock();
        self.views.lock().unwrap().push(view.clone());
    }

    fn set_kill_enabled(&self, enabled: bool) {
        self.check_lock();
        self.kill_enabled.lock().unwrap().push(enabled);
    }
}

impl RecordingLogSink {
    pub fn new(lock: &UpdateLock) -> Self {
        Self {
            lock: lock.clone(),
            logs: Mutex::default(),
            unlocked: AtomicBool::new(false),
        }
    }

    pub fn logs(&self) -> Vec<(String, bool)> {
        self.logs.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.logs().into_iter().map(|(text, _)| text).collect()
    }

    pub fn rendered_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }
}

impl LogSink for RecordingLogSink {
    fn render_log(&self, text: &str, scroll_to_end: bool) {
        if !self.lock.is_held() {
            self.unlocked.store(true, Ordering::SeqCst);
        }
        self.logs.lock().unwrap().push((text.to_owned(), scroll_to_end));
    }
}
