pub mod error;
pub mod job_status;
pub mod log_tailer;
pub mod monitor;

#[cfg(test)]
mod test_support;

pub mod prelude {
    #[rustfmt::skip]
    pub use super::{
        error::PollerError,
        job_status::JobStatusPoller,
        log_tailer::LogTailer,
        monitor::{ClusterLoadMonitor, JobMonitor},
    };
}
