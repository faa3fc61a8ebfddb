//! Tracker core: pure job-tracking state machine and view-model helpers.
mod config;
mod effect;
mod job;
mod msg;
mod simulator;
mod state;
mod update;
mod view_model;

pub use config::{ConfigError, DegradedPhasePolicy, TrackerConfig, DEFAULT_PHASE_LABELS};
pub use effect::Effect;
pub use job::{InvalidJobId, JobId, JobState, StatusSnapshot};
pub use msg::Msg;
pub use simulator::{PhaseIndex, ProgressSimulator};
pub use state::{ControllerState, TrackerState};
pub use update::update;
pub use view_model::{PhaseRowView, PhaseStatus, TrackerViewModel};
