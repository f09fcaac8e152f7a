#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("No job is being tracked")]
    NoJob,
    #[error("User {user} may not kill job {job_id}")]
    NotPermitted { user: String, job_id: String },
    #[error("Failed to kill job {job_id}: {reason}")]
    Kill { job_id: String, reason: String },
}
