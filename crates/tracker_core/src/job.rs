use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job id must not be empty")]
pub struct InvalidJobId;

/// Opaque handle to a submitted analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidJobId> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InvalidJobId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of the finished report for this job.
    pub fn report_path(&self) -> String {
        format!("/report/{}", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    Queued,
    #[default]
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Unrecognised values map to `Running` so they can never end tracking.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => JobState::Queued,
            "completed" => JobState::Completed,
            "failed" => JobState::Failed,
            _ => JobState::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One polled observation of a job's server-side state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub job_id: JobId,
    pub state: JobState,
    /// Always within `0..=100`. Not monotonic across polls.
    pub progress_percent: u8,
    pub current_agent: Option<String>,
    pub message: Option<String>,
}

impl StatusSnapshot {
    pub fn new(job_id: JobId, state: JobState, progress_percent: u8) -> Self {
        Self {
            job_id,
            state,
            progress_percent: progress_percent.min(100),
            current_agent: None,
            message: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.current_agent = Some(agent.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
