use std::path::Path;
use std::time::Duration;

use typed_builder::TypedBuilder;

/// How a log file is tailed
#[derive(Debug, Clone, TypedBuilder)]
pub struct TailOptions {
    /// Upper bound of the published text in bytes
    #[builder(default = TailOptions::DEFAULT_MAX_BYTES)]
    pub max_bytes: usize,
    /// Keep the end of an oversized file instead of its beginning
    #[builder(default = true)]
    pub show_end: bool,
    #[builder(default = TailOptions::DEFAULT_UPDATE_INTERVAL)]
    pub update_interval: Duration,
}

/// Current content of a tailed file, already cut down to the byte budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSnapshot {
    pub content: String,
    pub show_end: bool,
}

impl TailOptions {
    pub const DEFAULT_MAX_BYTES: usize = 16384;
    pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);
}

impl Default for TailOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LogSnapshot {
    pub fn from_bytes(bytes: &[u8], options: &TailOptions) -> Self {
        let max = options.max_bytes;
        let kept = match bytes.len() > max {
            false => bytes,
            true if options.show_end => &bytes[bytes.len() - max..],
            true => &bytes[..max],
        };
        Self {
            content: String::from_utf8_lossy(kept).into_owned(),
            show_end: options.show_end,
        }
    }

    pub fn unreadable(path: &Path, options: &TailOptions) -> Self {
        Self {
            content: format!("Couldn't open log file {}", path.display()),
            show_end: options.show_end,
        }
    }

    /// A head view holding at most a single byte (typically a lone newline)
    /// counts as still empty.
    pub fn is_publishable(&self) -> bool {
        self.show_end || self.content.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn options(max_bytes: usize, show_end: bool) -> TailOptions {
        TailOptions::builder().max_bytes(max_bytes).show_end(show_end).build()
    }

    #[test]
    fn defaults() {
        let options = TailOptions::default();
        assert_eq!(options.max_bytes, 16384);
        assert!(options.show_end);
        assert_eq!(options.update_interval, Duration::from_secs(1));
    }

    #[test]
    fn short_content_is_kept() {
        let log = indoc! {"
            Starting stage 1
            Shutting down with code 0
        "};
        let snapshot = LogSnapshot::from_bytes(log.as_bytes(), &options(1024, true));
        assert_eq!(snapshot.content, log);
    }

    #[test]
    fn truncate_keeps_tail() {
        let snapshot = LogSnapshot::from_bytes(b"0123456789", &options(4, true));
        assert_eq!(snapshot.content, "6789");
    }

    #[test]
    fn truncate_keeps_head() {
        let snapshot = LogSnapshot::from_bytes(b"0123456789", &options(4, false));
        assert_eq!(snapshot.content, "0123");
    }

    #[test]
    fn exact_budget_is_untouched() {
        let snapshot = LogSnapshot::from_bytes(b"0123", &options(4, false));
        assert_eq!(snapshot.content, "0123");
    }

    #[test]
    fn near_empty_head_is_not_publishable() {
        assert!(!LogSnapshot::from_bytes(b"\n", &options(16, false)).is_publishable());
        assert!(!LogSnapshot::from_bytes(b"", &options(16, false)).is_publishable());
        assert!(LogSnapshot::from_bytes(b"ok", &options(16, false)).is_publishable());
        assert!(LogSnapshot::from_bytes(b"\n", &options(16, true)).is_publishable());
    }

    #[test]
    fn unreadable_message() {
        let snapshot = LogSnapshot::unreadable(Path::new("/tmp/missing.std"), &options(16, true));
        assert_eq!(snapshot.content, "Couldn't open log file /tmp/missing.std");
    }
}
