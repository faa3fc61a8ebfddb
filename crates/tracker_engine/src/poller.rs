use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracker_core::{JobId, StatusSnapshot};
use tracker_logging::tracker_debug;

use crate::{FetchError, StatusFetcher};

/// Fetches a job's status on a fixed cadence until stopped.
///
/// The first request goes out immediately. Each following request starts `interval`
/// after the previous one settled, so requests for one job never overlap. Failures
/// go to `on_error` and polling carries on.
///
/// Callbacks run under the poller's gate lock, which `stop` also takes. Once `stop`
/// returns no callback is running or will run. A callback must not call `stop` on
/// its own poller.
pub struct Poller {
    token: CancellationToken,
    gate: Arc<Mutex<bool>>,
}

impl Poller {
    /// Spawns the polling task on `runtime`.
    pub fn start<S, E>(
        runtime: &Handle,
        fetcher: Arc<dyn StatusFetcher>,
        job_id: JobId,
        interval: Duration,
        on_snapshot: S,
        on_error: E,
    ) -> Self
    where
        S: Fn(StatusSnapshot) + Send + 'static,
        E: Fn(FetchError) + Send + 'static,
    {
        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(true));
        let cancelled = token.clone();
        let task_gate = gate.clone();

        runtime.spawn(async move {
            loop {
                let result = tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    result = fetcher.fetch_status(&job_id) => result,
                };
                {
                    // A stop issued while the request was in flight discards its result.
                    let open = task_gate.lock().unwrap_or_else(PoisonError::into_inner);
                    if !*open {
                        break;
                    }
                    match result {
                        Ok(snapshot) => on_snapshot(snapshot),
                        Err(err) => on_error(err),
                    }
                }

                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracker_debug!("poller for job {} stopped", job_id);
        });

        Self { token, gate }
    }

    /// Idempotent. Waits for a callback that is already running to finish.
    pub fn stop(&self) {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
