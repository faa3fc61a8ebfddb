use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PHASE_LABELS: [&str; 4] = [
    "Document Processing",
    "Data Collection",
    "Multi-Agent Analysis",
    "Report Generation",
];

/// Whether the simulated phase keeps moving while polls are failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegradedPhasePolicy {
    #[default]
    Advance,
    Freeze,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("phase_count must be at least 2, got {0}")]
    TooFewPhases(usize),
    #[error("max_consecutive_failures must be greater than zero when set")]
    ZeroFailureLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub sim_interval: Duration,
    pub phase_count: usize,
    pub phase_labels: Vec<String>,
    /// `None` polls until a terminal state or unmount.
    pub max_consecutive_failures: Option<u32>,
    /// `None` tracks without a wall-clock ceiling.
    pub max_tracking_duration: Option<Duration>,
    pub degraded_phase_policy: DegradedPhasePolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            sim_interval: Duration::from_secs(7),
            phase_count: DEFAULT_PHASE_LABELS.len(),
            phase_labels: DEFAULT_PHASE_LABELS.iter().map(|s| s.to_string()).collect(),
            max_consecutive_failures: None,
            max_tracking_duration: None,
            degraded_phase_policy: DegradedPhasePolicy::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("poll_interval"));
        }
        if self.sim_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("sim_interval"));
        }
        if self.phase_count < 2 {
            return Err(ConfigError::TooFewPhases(self.phase_count));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(ConfigError::ZeroFailureLimit);
        }
        Ok(())
    }

    pub fn phase_label(&self, index: usize) -> String {
        self.phase_labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Phase {}", index + 1))
    }
}
