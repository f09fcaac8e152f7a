use std::path::{Path, PathBuf};

/// A cluster job being watched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Path of the script the job was submitted with
    pub cluster_script_path: PathBuf,
    /// Wrapper script whose `.std` log tells how the job ended
    pub meta_script_name: String,
    /// Scheduler id, may be empty if the job is not queued yet
    pub job_id: String,
    pub owner_user_name: String,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Unset,
    Unknown,
    Waiting,
    Queued,
    Running,
    CompletedFailure,
    CompletedSuccess,
}

impl JobDescriptor {
    pub fn new(
        cluster_script_path: impl Into<PathBuf>,
        meta_script_name: impl Into<String>,
        job_id: impl Into<String>,
        owner_user_name: impl Into<String>,
    ) -> Self {
        Self {
            cluster_script_path: cluster_script_path.into(),
            meta_script_name: meta_script_name.into(),
            job_id: job_id.into(),
            owner_user_name: owner_user_name.into(),
        }
    }

    /// Both the job id and the script path are needed before anything can be queried.
    pub fn is_trackable(&self) -> bool {
        !self.job_id.is_empty() && !self.cluster_script_path.as_os_str().is_empty()
    }

    /// `<dirname(cluster_script_path)>/<meta_script_name>.std`
    pub fn meta_script_log(&self) -> PathBuf {
        self.meta_script_file("std")
    }

    /// `<dirname(cluster_script_path)>/<meta_script_name>.err`
    pub fn meta_script_err(&self) -> PathBuf {
        self.meta_script_file("err")
    }

    pub fn is_owned_by(&self, user: &str) -> bool {
        self.owner_user_name == user
    }

    fn meta_script_file(&self, ext: &str) -> PathBuf {
        let dir = self.cluster_script_path.parent().unwrap_or(Path::new(""));
        dir.join(format!("{}.{ext}", self.meta_script_name))
    }
}

impl JobStatus {
    /// Classify the `<process> <STATUS>` line printed by the status script.
    ///
    /// Anything that does not carry a second token is `Unknown`, which the
    /// caller resolves by looking at the meta-script log.
    pub fn classify(output: &str) -> Self {
        let mut tokens = output.split_whitespace();
        let _process = tokens.next();
        match tokens.next() {
            None => Self::Unknown,
            Some("QUEUED") => Self::Queued,
            Some(_) => Self::Running,
        }
    }

    /// Map the return code found at the bottom of the meta-script log.
    pub fn from_completion_code(code: &str) -> Self {
        match code.split_whitespace().next() {
            Some("0") => Self::CompletedSuccess,
            _ => Self::CompletedFailure,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Unknown => "UNKNOWN",
            Self::Waiting => "WAITING TO BE QUEUED",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::CompletedFailure => "COMPLETED (FAILURE)",
            Self::CompletedSuccess => "COMPLETED (SUCCESS)",
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::Unknown | Self::Waiting => Some("icons/lg-alertY-glass.png"),
            Self::Queued | Self::Running => Some("icons/lg-alertO-glass.png"),
            Self::CompletedFailure => Some("icons/lg-failed-glass.png"),
            Self::CompletedSuccess => Some("icons/lg-success-glass.png"),
        }
    }

    /// Whether a job in this state can still be cancelled.
    pub fn is_killable(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}
