use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Fixed-interval clock driving the simulated phase.
///
/// The first tick fires one full interval after start. Ticks that pile up behind a
/// slow consumer are delayed rather than burst. As with [`crate::Poller`], no tick
/// is delivered once `stop` has returned.
pub struct SimulationTimer {
    token: CancellationToken,
    gate: Arc<Mutex<bool>>,
}

impl SimulationTimer {
    /// Spawns the timer task on `runtime`.
    pub fn start<F>(runtime: &Handle, interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(true));
        let cancelled = token.clone();
        let task_gate = gate.clone();

        runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let open = task_gate.lock().unwrap_or_else(PoisonError::into_inner);
                if !*open {
                    break;
                }
                on_tick();
            }
        });

        Self { token, gate }
    }

    /// Idempotent.
    pub fn stop(&self) {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for SimulationTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
