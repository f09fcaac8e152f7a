use crate::model::entity::JobStatus;

/// What the status widget shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub label: &'static str,
    pub icon: Option<&'static str>,
    pub kill_enabled: bool,
}

impl StatusView {
    pub const DETERMINING: &'static str = "DETERMINING STATUS...";

    /// Kill is offered only to the owner, and only while the job can still be cancelled.
    pub fn of(status: JobStatus, owner_matches: bool) -> Self {
        Self {
            label: status.label(),
            icon: status.icon(),
            kill_enabled: owner_matches && status.is_killable(),
        }
    }

    pub fn determining() -> Self {
        Self {
            label: Self::DETERMINING,
            icon: None,
            kill_enabled: false,
        }
    }

    pub fn blank() -> Self {
        Self::of(JobStatus::Unset, false)
    }
}
