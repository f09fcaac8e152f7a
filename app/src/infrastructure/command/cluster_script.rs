use std::ffi::OsString;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use domain::{model::vo::ClusterSettings, service::ClusterScripts};
use regex::Regex;
use tokio::process::Command;

const STATUS_SCRIPT: &str = "cluster_status.bash";
const KILL_SCRIPT: &str = "cluster_kill.bash";
const SYSTEM_PATH: &str = "/bin:/usr/bin:/usr/local/bin:/opt/local/bin";

/// Runs the cluster helper scripts found in the configured script directory.
///
/// Arguments are passed as an argv vector, never through a shell.
pub struct ClusterScriptRunner {
    settings: ClusterSettings,
}

impl ClusterScriptRunner {
    pub fn new(settings: ClusterSettings) -> Self {
        Self { settings }
    }

    fn search_path(&self) -> OsString {
        let mut path = OsString::from(self.settings.script_dir.as_os_str());
        path.push(":");
        path.push(SYSTEM_PATH);
        if let Some(inherited) = std::env::var_os("PATH") {
            path.push(":");
            path.push(inherited);
        }
        path
    }

    fn command(&self, program: &str) -> Command {
        let mut command = Command::new(program);
        command.env("PATH", self.search_path());
        command
    }

    fn script(&self, program: &str, job_id: &str) -> anyhow::Result<Command> {
        let job_id = self.settings.scheduler_job_id(job_id);
        check_argument("job id", &job_id)?;
        check_argument("cluster type", &self.settings.cluster_type)?;

        let mut command = self.command(program);
        command.args(["-J", &job_id, "-C", &self.settings.cluster_type]);
        if let Some(head_node) = &self.settings.head_node {
            check_argument("head node", head_node)?;
            command.args(["-r", head_node]);
        }
        Ok(command)
    }
}

#[async_trait::async_trait]
impl ClusterScripts for ClusterScriptRunner {
    async fn query_status(&self, job_id: &str) -> anyhow::Result<String> {
        let mut command = self.script(STATUS_SCRIPT, job_id)?;
        tracing::debug!(job_id, "running {:?}", command.as_std());
        let out = command.output().await.with_context(|| format!("Cannot run {STATUS_SCRIPT}"))?;
        if !out.status.success() {
            anyhow::bail!("Exit Status not 0 for query_status. real: {}", out.status)
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    async fn kill(&self, job_id: &str) -> anyhow::Result<()> {
        let mut command = self.script(KILL_SCRIPT, job_id)?;
        tracing::debug!(job_id, "running {:?}", command.as_std());
        let out = command.output().await.with_context(|| format!("Cannot run {KILL_SCRIPT}"))?;
        if !out.status.success() {
            anyhow::bail!(
                "Exit Status not 0 for kill. real: {}, stderr: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )
        }
        Ok(())
    }

    async fn completion_code(&self, meta_script_log: &Path) -> anyhow::Result<String> {
        let out = self
            .command("tail")
            .arg("-2")
            .arg(meta_script_log)
            .output()
            .await
            .context("Cannot run tail")?;
        if !out.status.success() {
            anyhow::bail!("Exit Status not 0 for completion_code. real: {}", out.status)
        }
        parse_completion_code(&String::from_utf8_lossy(&out.stdout))
            .with_context(|| format!("No return code in {}", meta_script_log.display()))
    }
}

/// Fifth field of the first line mentioning `code`.
///
/// The meta script ends its log with a line such as
/// `Shutting down with code 0`.
fn parse_completion_code(tail: &str) -> Option<String> {
    tail.lines()
        .filter(|line| line.contains("code"))
        .find_map(|line| line.split_whitespace().nth(4))
        .map(str::to_owned)
}

fn check_argument(what: &str, value: &str) -> anyhow::Result<()> {
    static ALLOWED: OnceLock<Regex> = OnceLock::new();
    let allowed = ALLOWED.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());
    if !allowed.is_match(value) {
        anyhow::bail!("Refusing {what} {value:?}: unexpected characters")
    }
    Ok(())
}
