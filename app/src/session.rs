use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use domain::model::entity::{JobDescriptor, TailOptions};
use infrastructure::sync::UpdateLock;
use service::prelude::*;

use crate::config::MonitorConfig;
use crate::infrastructure::{
    command::ClusterScriptRunner,
    terminal::{TerminalLogSink, TerminalStatusSink},
};

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Show,
    Hide,
    Kill,
    Reset,
    Select(JobDescriptor),
    Help,
    Quit,
}

/// Every poller of one interactive session, wired to the terminal.
pub struct Session {
    update_lock: UpdateLock,
    current_user: String,
    job: JobMonitor,
    cluster_load: Option<ClusterLoadMonitor>,
}

impl Session {
    pub fn new(config: &MonitorConfig) -> Self {
        let update_lock = UpdateLock::new();
        let scripts = Arc::new(ClusterScriptRunner::new(config.cluster.settings()));
        let tail = TailOptions::builder()
            .max_bytes(config.max_log_bytes())
            .update_interval(config.log_update_interval())
            .build();

        let job = JobMonitor::new(
            JobStatusPoller::new(
                scripts,
                Arc::new(TerminalStatusSink),
                update_lock.clone(),
                &config.current_user,
                config.poll_interval(),
            ),
            LogTailer::new(
                PathBuf::new(),
                Arc::new(TerminalLogSink::new("stdout")),
                update_lock.clone(),
                tail.clone(),
            ),
            LogTailer::new(
                PathBuf::new(),
                Arc::new(TerminalLogSink::new("stderr")),
                update_lock.clone(),
                tail,
            ),
        );

        let cluster_load = config.top_log_file.as_ref().map(|top| {
            ClusterLoadMonitor::new(
                top,
                Arc::new(TerminalLogSink::new("cluster load")),
                update_lock.clone(),
                config.max_log_bytes(),
                config.log_update_interval(),
            )
        });

        Self {
            update_lock,
            current_user: config.current_user.clone(),
            job,
            cluster_load,
        }
    }

    pub async fn open(&self, job: Option<JobDescriptor>) {
        self.show();
        if let Some(job) = job {
            self.job.select_job(job).await;
        }
    }

    pub async fn handle(&self, request: Request) -> ControlFlow<()> {
        match request {
            Request::Show => self.show(),
            Request::Hide => {
                self.job.stop_update();
                if let Some(load) = &self.cluster_load {
                    load.stop_update();
                }
            }
            Request::Kill => {
                if let Err(e) = self.job.kill_job().await {
                    self.notify(&e.to_string()).await;
                }
            }
            Request::Reset => self.job.reset().await,
            Request::Select(job) => self.job.select_job(job).await,
            Request::Help => self.notify(Request::USAGE).await,
            Request::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub async fn close(&self) {
        match &self.cluster_load {
            Some(load) => {
                tokio::join!(self.job.finalize(), load.finalize());
            }
            None => self.job.finalize().await,
        }
        tracing::info!("Session closed");
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    fn show(&self) {
        self.job.start_update();
        if let Some(load) = &self.cluster_load {
            load.start_update();
        }
    }

    /// Messages share the terminal with the pollers.
    async fn notify(&self, message: &str) {
        let _guard = self.update_lock.acquire().await;
        println!("{}", message.red());
    }
}

impl Request {
    pub const USAGE: &'static str =
        "commands: show | hide | kill | reset | job <cluster_script> <meta_script> <job_id> [owner] | quit";

    /// A `job` line without an owner selects a job of `current_user`.
    pub fn parse(line: &str, current_user: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let request = match words.next() {
            Some("show") => Self::Show,
            Some("hide") => Self::Hide,
            Some("kill") => Self::Kill,
            Some("reset") => Self::Reset,
            Some("help") | None => Self::Help,
            Some("quit") | Some("exit") => Self::Quit,
            Some("job") => {
                let args = words.by_ref().take(4).collect::<Vec<_>>();
                let [cluster_script, meta_script, job_id, rest @ ..] = args.as_slice() else {
                    anyhow::bail!("usage: job <cluster_script> <meta_script> <job_id> [owner]");
                };
                let owner = rest.first().copied().unwrap_or(current_user);
                Self::Select(JobDescriptor::new(
                    *cluster_script,
                    *meta_script,
                    *job_id,
                    owner,
                ))
            }
            Some(other) => anyhow::bail!("unknown command `{other}`"),
        };
        if words.next().is_some() {
            anyhow::bail!("unexpected arguments in `{}`", line.trim());
        }
        Ok(request)
    }
}
