use crate::{ControllerState, JobId, JobState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRowView {
    pub label: String,
    pub status: PhaseStatus,
}

/// Rendering-ready projection, rebuilt from state on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerViewModel {
    pub job_id: JobId,
    /// `Queued` until the first snapshot arrives.
    pub state: JobState,
    pub controller: ControllerState,
    /// Taken from the latest real snapshot, 0 before the first one.
    pub progress_percent: u8,
    pub phase_index: usize,
    pub phase_label: String,
    pub phases: Vec<PhaseRowView>,
    pub current_agent: Option<String>,
    pub message: Option<String>,
    pub degraded: bool,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}
