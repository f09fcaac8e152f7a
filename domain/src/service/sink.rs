use crate::model::vo::StatusView;

/// Receives status updates. Only ever called while the session update lock is held.
pub trait StatusSink: Send + Sync {
    fn render_status(&self, view: &StatusView);

    fn set_kill_enabled(&self, enabled: bool);
}

/// Receives log text. Only ever called while the session update lock is held.
pub trait LogSink: Send + Sync {
    fn render_log(&self, text: &str, scroll_to_end: bool);
}
