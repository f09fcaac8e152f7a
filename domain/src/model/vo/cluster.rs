use std::path::PathBuf;

/// Site settings the cluster scripts are invoked with
#[derive(Debug, Clone, Default)]
pub struct ClusterSettings {
    pub cluster_type: String,
    /// Passed as `-r` when set
    pub head_node: Option<String>,
    /// Prepended to `PATH` of every invoked command
    pub script_dir: PathBuf,
    pub job_id_prefix: String,
}

impl ClusterSettings {
    /// The id the scheduler knows the job by.
    pub fn scheduler_job_id(&self, job_id: &str) -> String {
        format!("{}{job_id}", self.job_id_prefix)
    }
}
