#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use tracker_core::{JobId, JobState, StatusSnapshot};
use tracker_engine::{FailureKind, FetchError, StatusFetcher};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

pub fn job() -> JobId {
    JobId::new("policy-7").unwrap()
}

pub fn snap(state: JobState, percent: u8) -> Result<StatusSnapshot, FetchError> {
    Ok(StatusSnapshot::new(job(), state, percent))
}

pub fn network_error() -> Result<StatusSnapshot, FetchError> {
    Err(FetchError::new(FailureKind::Network, "connection refused"))
}

/// Replays a fixed script of responses, repeating the last one once exhausted.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<StatusSnapshot, FetchError>>>,
    last: Mutex<Option<Result<StatusSnapshot, FetchError>>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<StatusSnapshot, FetchError>>) -> Self {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<Result<StatusSnapshot, FetchError>>, delay: Duration) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<StatusSnapshot, FetchError> {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(FetchError::new(FailureKind::Network, "empty script")))
    }
}

#[async_trait::async_trait]
impl StatusFetcher for ScriptedFetcher {
    async fn fetch_status(&self, _job_id: &JobId) -> Result<StatusSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let response = self.next_response();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
