use crate::view_model::{PhaseRowView, PhaseStatus, TrackerViewModel};
use crate::{JobId, JobState, ProgressSimulator, StatusSnapshot, TrackerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Active,
    /// A `completed` snapshot was seen and navigation was requested.
    Redirecting,
    /// The server reported `failed`.
    Failed,
    /// A tracking policy (failure streak or deadline) ran out.
    GaveUp,
    Disposed,
}

impl ControllerState {
    pub fn is_active(self) -> bool {
        self == ControllerState::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    job_id: JobId,
    config: TrackerConfig,
    controller: ControllerState,
    latest: Option<StatusSnapshot>,
    simulator: ProgressSimulator,
    consecutive_failures: u32,
    last_error: Option<String>,
    dirty: bool,
}

impl TrackerState {
    pub fn new(job_id: JobId, config: TrackerConfig) -> Self {
        let simulator = ProgressSimulator::new(config.phase_count);
        Self {
            job_id,
            config,
            controller: ControllerState::Active,
            latest: None,
            simulator,
            consecutive_failures: 0,
            last_error: None,
            dirty: true,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn controller(&self) -> ControllerState {
        self.controller
    }

    pub fn latest(&self) -> Option<&StatusSnapshot> {
        self.latest.as_ref()
    }

    pub fn phase_index(&self) -> usize {
        self.simulator.index()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_degraded(&self) -> bool {
        self.controller.is_active() && self.consecutive_failures > 0
    }

    pub fn view(&self) -> TrackerViewModel {
        let state = self.latest.as_ref().map_or(JobState::Queued, |s| s.state);
        let completed = state == JobState::Completed;
        let phase_index = self.simulator.index();
        let phases = (0..self.simulator.phase_count())
            .map(|index| PhaseRowView {
                label: self.config.phase_label(index),
                status: if completed || index < phase_index {
                    PhaseStatus::Completed
                } else if index == phase_index {
                    PhaseStatus::Active
                } else {
                    PhaseStatus::Pending
                },
            })
            .collect();

        TrackerViewModel {
            job_id: self.job_id.clone(),
            state,
            controller: self.controller,
            progress_percent: self.latest.as_ref().map_or(0, |s| s.progress_percent),
            phase_index,
            phase_label: self.config.phase_label(phase_index),
            phases,
            current_agent: self.latest.as_ref().and_then(|s| s.current_agent.clone()),
            message: self.latest.as_ref().and_then(|s| s.message.clone()),
            degraded: self.is_degraded(),
            last_error: self.last_error.clone(),
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_controller(&mut self, next: ControllerState) {
        if self.controller != next {
            tracker_logging::tracker_debug!(
                "job {} controller {:?} -> {:?}",
                self.job_id,
                self.controller,
                next
            );
            self.controller = next;
            self.mark_dirty();
        }
    }

    pub(crate) fn store_snapshot(&mut self, snapshot: StatusSnapshot) {
        self.consecutive_failures = 0;
        self.last_error = None;
        self.latest = Some(snapshot);
        self.mark_dirty();
    }

    /// Records a transient failure and returns the current streak length.
    pub(crate) fn record_failure(&mut self, error: String) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
        self.mark_dirty();
        self.consecutive_failures
    }

    pub(crate) fn simulator_mut(&mut self) -> &mut ProgressSimulator {
        &mut self.simulator
    }
}
