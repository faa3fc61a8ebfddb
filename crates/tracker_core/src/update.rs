use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::{ControllerState, DegradedPhasePolicy, Effect, JobState, Msg, TrackerState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every exit from `Active` emits `StopPolling` and `StopSimulation` exactly once, so
/// later teardown never has to stop the timers a second time.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::SnapshotReceived(snapshot) => {
            if !state.controller().is_active() {
                tracker_debug!(
                    "job {} ignoring {} snapshot in {:?}",
                    state.job_id(),
                    snapshot.state,
                    state.controller()
                );
                return (state, Vec::new());
            }
            if snapshot.job_id != *state.job_id() {
                tracker_warn!(
                    "job {} ignoring snapshot for foreign job {}",
                    state.job_id(),
                    snapshot.job_id
                );
                return (state, Vec::new());
            }

            let job_state = snapshot.state;
            state.store_snapshot(snapshot);
            match job_state {
                JobState::Completed => {
                    state.simulator_mut().force_final();
                    state.set_controller(ControllerState::Redirecting);
                    let job_id = state.job_id().clone();
                    let location = job_id.report_path();
                    tracker_info!("job {} completed, redirecting to {}", job_id, location);
                    vec![
                        Effect::StopPolling,
                        Effect::StopSimulation,
                        Effect::Navigate { job_id, location },
                    ]
                }
                JobState::Failed => {
                    state.simulator_mut().stop();
                    state.set_controller(ControllerState::Failed);
                    tracker_warn!("job {} reported failure", state.job_id());
                    vec![Effect::StopPolling, Effect::StopSimulation]
                }
                JobState::Queued | JobState::Running => Vec::new(),
            }
        }
        Msg::FetchFailed { error } => {
            if !state.controller().is_active() {
                return (state, Vec::new());
            }
            tracker_warn!("job {} poll failed: {}", state.job_id(), error);
            let streak = state.record_failure(error);
            match state.config().max_consecutive_failures {
                Some(limit) if streak >= limit => {
                    tracker_warn!(
                        "job {} giving up after {} consecutive failures",
                        state.job_id(),
                        streak
                    );
                    give_up(&mut state)
                }
                _ => Vec::new(),
            }
        }
        Msg::SimTick => {
            if !state.controller().is_active() {
                return (state, Vec::new());
            }
            let frozen = state.is_degraded()
                && state.config().degraded_phase_policy == DegradedPhasePolicy::Freeze;
            if !frozen {
                state.simulator_mut().tick();
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::DeadlineElapsed => {
            if !state.controller().is_active() {
                return (state, Vec::new());
            }
            tracker_warn!("job {} tracking deadline elapsed", state.job_id());
            give_up(&mut state)
        }
        Msg::Unmount => {
            let was_active = state.controller().is_active();
            if state.controller() != ControllerState::Disposed {
                state.simulator_mut().stop();
                state.set_controller(ControllerState::Disposed);
            }
            if was_active {
                vec![Effect::StopPolling, Effect::StopSimulation]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn give_up(state: &mut TrackerState) -> Vec<Effect> {
    state.simulator_mut().stop();
    state.set_controller(ControllerState::GaveUp);
    vec![Effect::StopPolling, Effect::StopSimulation]
}
