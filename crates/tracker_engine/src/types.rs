use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracker_core::{JobId, JobState, StatusSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed status payload"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Status document as served by `GET /api/status/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusPayload {
    #[serde(alias = "job_id")]
    pub policy_id: String,
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_agent: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusPayload {
    pub fn into_snapshot(self) -> Result<StatusSnapshot, FetchError> {
        let job_id = JobId::new(&self.policy_id)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        Ok(StatusSnapshot {
            job_id,
            state: JobState::parse(&self.status),
            progress_percent: clamp_percent(self.progress.unwrap_or(0.0)),
            current_agent: non_empty(self.current_agent),
            message: non_empty(self.message),
        })
    }
}

fn clamp_percent(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
