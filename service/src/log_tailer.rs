use std::path::{Path, PathBuf};
use std::sync::Arc;

use domain::{
    model::entity::{LogSnapshot, TailOptions},
    service::LogSink,
};
use infrastructure::sync::{SessionCell, UpdateLock, Worker, WorkerState};

/// Republishes the content of a log file whenever it changes.
///
/// The file is re-read in full each cycle and cut down to
/// [`TailOptions::max_bytes`], keeping its end or its beginning.
pub struct LogTailer {
    inner: Arc<Inner>,
    worker: Worker,
}

struct Inner {
    cell: SessionCell<Tail>,
    options: TailOptions,
    sink: Arc<dyn LogSink>,
}

struct Tail {
    path: PathBuf,
    published: String,
}

impl LogTailer {
    pub fn new(
        path: impl Into<PathBuf>,
        sink: Arc<dyn LogSink>,
        update_lock: UpdateLock,
        options: TailOptions,
    ) -> Self {
        let tail = Tail {
            path: path.into(),
            published: String::new(),
        };
        Self {
            worker: Worker::new(options.update_interval),
            inner: Arc::new(Inner {
                cell: SessionCell::new(tail, update_lock),
                options,
                sink,
            }),
        }
    }

    /// Point the tailer at another file. Does not start polling.
    pub async fn set_log_file(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::debug!(path = %path.display(), "Tailing log file");
        self.inner.cell.lock().await.path = path;
    }

    pub async fn log_file(&self) -> PathBuf {
        self.inner.cell.lock().await.path.clone()
    }

    /// Start or resume polling. The file is read right away.
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

    pub async fn finalize(&self) {
        self.worker.stop().await;
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn options(&self) -> &TailOptions {
        &self.inner.options
    }

    /// The text last pushed to the sink.
    pub async fn content(&self) -> String {
        self.inner.cell.lock().await.published.clone()
    }
}

impl Inner {
    async fn poll(&self) {
        let path = self.cell.lock().await.path.clone();
        let (snapshot, readable) = self.read(&path).await;

        let mut tail = self.cell.lock().await;
        if tail.path != path || tail.published == snapshot.content || !snapshot.is_publishable() {
            return;
        }
        tail.published.clone_from(&snapshot.content);

        let scroll_to_end = readable && snapshot.show_end;
        self.cell
            .publish(tail, || self.sink.render_log(&snapshot.content, scroll_to_end))
            .await;
    }

    async fn read(&self, path: &Path) -> (LogSnapshot, bool) {
        match tokio::fs::read(path).await {
            Ok(bytes) => (LogSnapshot::from_bytes(&bytes, &self.options), true),
            Err(e) => {
                tracing::debug!(path = %path.display(), "Cannot open log file: {e}");
                (LogSnapshot::unreadable(path, &self.options), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::test_support::RecordingLogSink;

    const SETTLE: Duration = Duration::from_millis(100);

    fn tailer(path: &Path, max_bytes: usize, show_end: bool) -> (LogTailer, Arc<RecordingLogSink>) {
        let lock = UpdateLock::new();
        let sink = Arc::new(RecordingLogSink::new(&lock));
        let options = TailOptions::builder()
            .max_bytes(max_bytes)
            .show_end(show_end)
            .update_interval(Duration::from_millis(20))
            .build();
        (LogTailer::new(path, sink.clone(), lock, options), sink)
    }

    #[tokio::test]
    async fn publishes_once_while_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.std");
        std::fs::write(&path, "stage 1\n").unwrap();

        let (tailer, sink) = tailer(&path, 1024, true);
        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;

        assert_eq!(sink.logs(), [("stage 1\n".to_owned(), true)]);
        assert!(!sink.rendered_unlocked());
    }

    #[tokio::test]
    async fn publishes_appended_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.std");
        std::fs::write(&path, "stage 1\n").unwrap();

        let (tailer, sink) = tailer(&path, 1024, true);
        tailer.start_update();
        sleep(SETTLE).await;
        std::fs::write(&path, "stage 1\nstage 2\n").unwrap();
        sleep(SETTLE).await;
        tailer.finalize().await;

        assert_eq!(sink.texts(), ["stage 1\n", "stage 1\nstage 2\n"]);
        assert_eq!(tailer.content().await, "stage 1\nstage 2\n");
    }

    #[tokio::test]
    async fn oversized_file_keeps_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.std");
        std::fs::write(&path, "0123456789").unwrap();

        let (tailer, sink) = tailer(&path, 4, true);
        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;

        assert_eq!(sink.logs(), [("6789".to_owned(), true)]);
    }

    #[tokio::test]
    async fn oversized_file_keeps_head_without_scrolling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.log");
        std::fs::write(&path, "0123456789").unwrap();

        let (tailer, sink) = tailer(&path, 4, false);
        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;

        assert_eq!(sink.logs(), [("0123".to_owned(), false)]);
    }

    #[tokio::test]
    async fn lone_newline_in_head_mode_is_not_published() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.log");
        std::fs::write(&path, "\n").unwrap();

        let (tailer, sink) = tailer(&path, 1024, false);
        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;

        assert!(sink.logs().is_empty());
    }

    #[tokio::test]
    async fn missing_file_shows_message_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.std");

        let (tailer, sink) = tailer(&path, 1024, true);
        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;

        let expected = format!("Couldn't open log file {}", path.display());
        assert_eq!(sink.logs(), [(expected, false)]);
    }

    #[tokio::test]
    async fn set_log_file_switches_source() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.std");
        let second = dir.path().join("b.std");
        std::fs::write(&first, "first\n").unwrap();
        std::fs::write(&second, "second\n").unwrap();

        let (tailer, sink) = tailer(&first, 1024, true);
        tailer.set_log_file(&second).await;
        assert_eq!(tailer.worker_state(), WorkerState::Stopped);

        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;
        assert_eq!(sink.texts(), ["second\n"]);
    }

    #[tokio::test]
    async fn stop_update_pauses_and_start_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.std");
        std::fs::write(&path, "one\n").unwrap();

        let (tailer, sink) = tailer(&path, 1024, true);
        tailer.start_update();
        sleep(SETTLE).await;
        tailer.stop_update();
        assert_eq!(tailer.worker_state(), WorkerState::Paused);

        std::fs::write(&path, "one\ntwo\n").unwrap();
        sleep(SETTLE).await;
        assert_eq!(sink.texts(), ["one\n"]);

        tailer.start_update();
        sleep(SETTLE).await;
        tailer.finalize().await;
        assert_eq!(sink.texts(), ["one\n", "one\ntwo\n"]);
    }
}
