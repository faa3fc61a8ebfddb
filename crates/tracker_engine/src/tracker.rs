//! Scoped lifecycle for tracking one job.
//!
//! [`TrackerHandle::mount`] starts a [`Poller`] and a [`SimulationTimer`] and funnels
//! their output through one channel into a single driver task. That task is the only
//! place the reducer runs, so snapshots and ticks are applied strictly one at a time
//! in the order they arrived.

use std::cell::Cell;
use std::future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracker_core::{
    update, ConfigError, Effect, JobId, Msg, TrackerConfig, TrackerState, TrackerViewModel,
};
use tracker_logging::{tracker_debug, tracker_info};

use crate::{Poller, SimulationTimer, StatusFetcher};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("tracker must be mounted from within a tokio runtime")]
    NoRuntime,
}

/// Rendering and navigation seam.
///
/// Calls happen on the driver task while an internal lock is held. Calling
/// [`TrackerHandle::dispose`] from inside a callback is allowed: the sink is
/// detached as soon as that callback returns and receives nothing further.
pub trait TrackerSink: Send + Sync {
    fn publish(&self, view: TrackerViewModel);
    fn navigate(&self, job_id: &JobId, location: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    View(TrackerViewModel),
    Navigate { job_id: JobId, location: String },
}

pub struct ChannelTrackerSink {
    tx: mpsc::Sender<TrackerEvent>,
}

impl ChannelTrackerSink {
    pub fn new(tx: mpsc::Sender<TrackerEvent>) -> Self {
        Self { tx }
    }
}

impl TrackerSink for ChannelTrackerSink {
    fn publish(&self, view: TrackerViewModel) {
        let _ = self.tx.send(TrackerEvent::View(view));
    }

    fn navigate(&self, job_id: &JobId, location: &str) {
        let _ = self.tx.send(TrackerEvent::Navigate {
            job_id: job_id.clone(),
            location: location.to_string(),
        });
    }
}

thread_local! {
    /// Address of the sink slot whose callback is running on this thread, or 0.
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

/// Holds the sink until the handle detaches it.
struct SinkSlot {
    sink: Mutex<Option<Arc<dyn TrackerSink>>>,
    detached: AtomicBool,
}

impl SinkSlot {
    fn new(sink: Arc<dyn TrackerSink>) -> Self {
        Self {
            sink: Mutex::new(Some(sink)),
            detached: AtomicBool::new(false),
        }
    }

    fn address(&self) -> usize {
        self as *const Self as usize
    }

    fn deliver(&self, f: impl FnOnce(&dyn TrackerSink)) {
        let mut guard = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.detached.load(Ordering::SeqCst) {
            if let Some(sink) = guard.as_ref() {
                let _scope = DeliveryScope::enter(self.address());
                f(&**sink);
            }
        }
        if self.detached.load(Ordering::SeqCst) {
            guard.take();
        }
    }

    fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        if DELIVERING.with(Cell::get) == self.address() {
            // Re-entrant: the lock is held further up this stack and `deliver`
            // clears the slot once the callback returns.
            tracker_debug!("sink detached from inside its own callback");
            return;
        }
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

struct DeliveryScope {
    previous: usize,
}

impl DeliveryScope {
    fn enter(address: usize) -> Self {
        Self {
            previous: DELIVERING.with(|current| current.replace(address)),
        }
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERING.with(|current| current.set(self.previous));
    }
}

/// Owns both timers of one tracked job. Dropping the handle disposes it.
pub struct TrackerHandle {
    job_id: JobId,
    token: CancellationToken,
    sink: Arc<SinkSlot>,
    disposed: AtomicBool,
}

impl TrackerHandle {
    /// Starts tracking `job_id` on the current tokio runtime.
    pub fn mount(
        job_id: JobId,
        config: TrackerConfig,
        fetcher: Arc<dyn StatusFetcher>,
        sink: Arc<dyn TrackerSink>,
    ) -> Result<Self, MountError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| MountError::NoRuntime)?;

        let (msg_tx, msg_rx) = unbounded_channel();
        let snapshot_tx = msg_tx.clone();
        let error_tx = msg_tx.clone();
        let poller = Poller::start(
            &runtime,
            fetcher,
            job_id.clone(),
            config.poll_interval,
            move |snapshot| {
                let _ = snapshot_tx.send(Msg::SnapshotReceived(snapshot));
            },
            move |err| {
                let _ = error_tx.send(Msg::FetchFailed {
                    error: err.to_string(),
                });
            },
        );
        let simulation = SimulationTimer::start(&runtime, config.sim_interval, move || {
            let _ = msg_tx.send(Msg::SimTick);
        });

        let token = CancellationToken::new();
        let sink = Arc::new(SinkSlot::new(sink));
        let deadline = config.max_tracking_duration;
        tracker_info!(
            "tracking job {} (poll every {:?}, phase every {:?})",
            job_id,
            config.poll_interval,
            config.sim_interval
        );

        let driver = Driver {
            state: Some(TrackerState::new(job_id.clone(), config)),
            poller,
            simulation,
            sink: sink.clone(),
        };
        runtime.spawn(driver.run(msg_rx, deadline, token.clone()));

        Ok(Self {
            job_id,
            token,
            sink,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Stops both timers and detaches the sink. Idempotent.
    ///
    /// Once this returns the sink receives no further calls, including for a
    /// snapshot that was already in flight.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.token.cancel();
        self.sink.detach();
        tracker_info!("stopped tracking job {}", self.job_id);
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct Driver {
    state: Option<TrackerState>,
    poller: Poller,
    simulation: SimulationTimer,
    sink: Arc<SinkSlot>,
}

impl Driver {
    async fn run(
        mut self,
        mut msg_rx: UnboundedReceiver<Msg>,
        deadline: Option<Duration>,
        token: CancellationToken,
    ) {
        self.publish_if_dirty();

        let deadline_timer = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_timer);
        let mut deadline_fired = false;

        loop {
            let msg = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = &mut deadline_timer, if !deadline_fired => {
                    deadline_fired = true;
                    Msg::DeadlineElapsed
                }
                msg = msg_rx.recv() => match msg {
                    Some(msg) => msg,
                    // Both timers have stopped and dropped their senders.
                    None => break,
                },
            };
            self.dispatch(msg);
        }

        // Teardown is not rendered.
        self.apply(Msg::Unmount);
        self.poller.stop();
        self.simulation.stop();
    }

    fn dispatch(&mut self, msg: Msg) {
        let navigation = self.apply(msg);
        self.publish_if_dirty();
        if let Some((job_id, location)) = navigation {
            self.sink.deliver(|sink| sink.navigate(&job_id, &location));
        }
    }

    /// Runs the reducer and executes timer effects. Returns a pending navigation.
    fn apply(&mut self, msg: Msg) -> Option<(JobId, String)> {
        let state = self.state.take()?;
        let (state, effects) = update(state, msg);
        self.state = Some(state);

        let mut navigation = None;
        for effect in effects {
            match effect {
                Effect::StopPolling => self.poller.stop(),
                Effect::StopSimulation => self.simulation.stop(),
                Effect::Navigate { job_id, location } => navigation = Some((job_id, location)),
            }
        }
        navigation
    }

    fn publish_if_dirty(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.consume_dirty() {
            let view = state.view();
            self.sink.deliver(|sink| sink.publish(view));
        }
    }
}
