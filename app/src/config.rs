use std::path::PathBuf;
use std::time::Duration;

use bytesize::ByteSize;
use config::{Config, ConfigError, Environment, File};
use domain::model::{entity::JobDescriptor, vo::ClusterSettings};
use serde::*;

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "Default::default")]
    pub cluster: ClusterConfig,

    #[serde(default = "MonitorConfig::default_current_user")]
    pub current_user: String,

    /// Seconds between two status queries
    #[serde(default = "MonitorConfig::default_poll_interval")]
    pub poll_interval: u64,

    /// Milliseconds between two reads of a tailed log
    #[serde(default = "MonitorConfig::default_log_update_interval")]
    pub log_update_interval: u64,

    #[serde(default = "MonitorConfig::default_max_log_size")]
    pub max_log_size: ByteSize,

    #[serde(default = "Default::default")]
    pub job: Option<JobConfig>,

    #[serde(default = "Default::default")]
    pub top_log_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "ClusterConfig::default_type")]
    pub r#type: String,

    #[serde(default = "Default::default")]
    pub head_node: Option<String>,

    #[serde(default = "ClusterConfig::default_script_dir")]
    pub script_dir: String,

    #[serde(default = "Default::default")]
    pub job_id_prefix: String,
}

/// Job to watch as soon as the session opens
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub cluster_script: String,

    pub meta_script: String,

    #[serde(default = "Default::default")]
    pub job_id: String,

    /// Defaults to the current user
    #[serde(default = "Default::default")]
    pub owner: Option<String>,
}

/// `config.yaml` in the working directory (optional), overridden by
/// `JOB_MONITOR_*` variables, `__` separating nested keys.
pub fn build_config() -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("JOB_MONITOR")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
}

impl MonitorConfig {
    pub fn default_current_user() -> String {
        std::env::var("USER").unwrap_or_default()
    }

    pub fn default_poll_interval() -> u64 {
        1
    }

    pub fn default_log_update_interval() -> u64 {
        1000
    }

    pub fn default_max_log_size() -> ByteSize {
        ByteSize::kib(16)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }

    pub fn log_update_interval(&self) -> Duration {
        Duration::from_millis(self.log_update_interval.max(100))
    }

    pub fn max_log_bytes(&self) -> usize {
        usize::try_from(self.max_log_size.as_u64()).unwrap_or(usize::MAX)
    }

    pub fn job(&self) -> Option<JobDescriptor> {
        self.job.as_ref().map(|job| job.descriptor(&self.current_user))
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            r#type: Self::default_type(),
            head_node: None,
            script_dir: Self::default_script_dir(),
            job_id_prefix: String::default(),
        }
    }
}

impl ClusterConfig {
    pub fn default_type() -> String {
        "local".to_owned()
    }

    pub fn default_script_dir() -> String {
        ".".to_owned()
    }

    pub fn settings(&self) -> ClusterSettings {
        ClusterSettings {
            cluster_type: self.r#type.clone(),
            head_node: self.head_node.clone().filter(|node| !node.is_empty()),
            script_dir: PathBuf::from(&self.script_dir),
            job_id_prefix: self.job_id_prefix.clone(),
        }
    }
}

impl JobConfig {
    pub fn descriptor(&self, current_user: &str) -> JobDescriptor {
        JobDescriptor::new(
            &self.cluster_script,
            &self.meta_script,
            &self.job_id,
            self.owner.as_deref().unwrap_or(current_user),
        )
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;
    use indoc::indoc;

    use super::*;

    fn parse(yaml: &str) -> MonitorConfig {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse("current_user: alice");
        assert_eq!(config.cluster.r#type, "local");
        assert_eq!(config.cluster.script_dir, ".");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.log_update_interval(), Duration::from_millis(1000));
        assert_eq!(config.max_log_bytes(), 16384);
        assert!(config.job().is_none());
    }

    #[test]
    fn full() {
        let config = parse(indoc! {r#"
            current_user: alice
            poll_interval: 5
            max_log_size: 32 KiB
            cluster:
              type: pbs
              head_node: ""
              script_dir: /opt/pipeline/scripts
              job_id_prefix: pl-
            job:
              cluster_script: /data/scan/log/cluster.sh
              meta_script: meta
              job_id: "1234"
              owner: bob
            top_log_file: /var/log/cluster/top.log
        "#});

        let settings = config.cluster.settings();
        assert_eq!(settings.cluster_type, "pbs");
        assert_eq!(settings.head_node, None);
        assert_eq!(settings.scheduler_job_id("1234"), "pl-1234");
        assert_eq!(config.max_log_bytes(), 32768);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));

        let job = config.job().unwrap();
        assert_eq!(job.owner_user_name, "bob");
        assert_eq!(job.meta_script_log(), PathBuf::from("/data/scan/log/meta.std"));
    }

    #[test]
    fn job_owner_defaults_to_current_user() {
        let config = parse(indoc! {r#"
            current_user: alice
            job:
              cluster_script: /data/cluster.sh
              meta_script: meta
              job_id: "7"
        "#});
        assert_eq!(config.job().unwrap().owner_user_name, "alice");
    }
}
