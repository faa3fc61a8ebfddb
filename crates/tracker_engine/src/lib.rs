//! Tracker engine: status transport, timers and the tracker lifecycle handle.
mod fetch;
mod poller;
mod timer;
mod tracker;
mod types;

pub use fetch::{FetchSettings, ReqwestStatusFetcher, StatusFetcher};
pub use poller::Poller;
pub use timer::SimulationTimer;
pub use tracker::{ChannelTrackerSink, MountError, TrackerEvent, TrackerHandle, TrackerSink};
pub use types::{FailureKind, FetchError, StatusPayload};
