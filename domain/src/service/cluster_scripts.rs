use std::path::Path;

/// The site's cluster management scripts.
#[async_trait::async_trait]
pub trait ClusterScripts: Send + Sync {
    /// Raw stdout of the status script, expected as `<process> <STATUS>`.
    async fn query_status(&self, job_id: &str) -> anyhow::Result<String>;

    async fn kill(&self, job_id: &str) -> anyhow::Result<()>;

    /// Return code printed on the "Shutting down with code ..." line at the
    /// bottom of a meta-script log.
    async fn completion_code(&self, meta_script_log: &Path) -> anyhow::Result<String>;
}
