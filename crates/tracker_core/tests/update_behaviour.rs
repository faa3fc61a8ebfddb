use std::sync::Once;

use pretty_assertions::assert_eq;
use tracker_core::{
    update, ControllerState, Effect, JobId, JobState, Msg, StatusSnapshot, TrackerConfig,
    TrackerState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn job() -> JobId {
    JobId::new("policy-1").unwrap()
}

fn tracker() -> TrackerState {
    TrackerState::new(job(), TrackerConfig::default())
}

fn snapshot(state: JobState, percent: u8) -> Msg {
    Msg::SnapshotReceived(StatusSnapshot::new(job(), state, percent))
}

fn failure() -> Msg {
    Msg::FetchFailed {
        error: "network error: connection reset".to_string(),
    }
}

/// Feeds messages in order and returns the final state plus every effect emitted.
fn run(state: TrackerState, msgs: Vec<Msg>) -> (TrackerState, Vec<Effect>) {
    msgs.into_iter()
        .fold((state, Vec::new()), |(state, mut all), msg| {
            let (next, effects) = update(state, msg);
            all.extend(effects);
            (next, all)
        })
}

fn navigations(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Navigate { .. }))
        .count()
}

#[test]
fn poll_sequence_redirects_on_first_completion() {
    init_logging();
    let mut state = tracker();
    let mut percents = Vec::new();
    let mut redirect_tick = None;

    let polls = vec![
        snapshot(JobState::Queued, 0),
        snapshot(JobState::Running, 40),
        snapshot(JobState::Running, 40),
        snapshot(JobState::Completed, 100),
    ];
    for (tick, msg) in polls.into_iter().enumerate() {
        let (next, effects) = update(state, msg);
        state = next;
        percents.push(state.view().progress_percent);
        if navigations(&effects) > 0 {
            assert!(redirect_tick.is_none());
            redirect_tick = Some(tick + 1);
        }
    }

    assert_eq!(percents, vec![0, 40, 40, 100]);
    assert_eq!(redirect_tick, Some(4));
    assert_eq!(state.controller(), ControllerState::Redirecting);
}

#[test]
fn completion_emits_stops_then_navigation() {
    init_logging();
    let (state, effects) = update(tracker(), snapshot(JobState::Completed, 100));

    assert_eq!(
        effects,
        vec![
            Effect::StopPolling,
            Effect::StopSimulation,
            Effect::Navigate {
                job_id: job(),
                location: "/report/policy-1".to_string(),
            },
        ]
    );
    assert_eq!(state.phase_index(), 3);
}

#[test]
fn repeated_completions_redirect_once() {
    init_logging();
    let (state, effects) = run(
        tracker(),
        vec![
            snapshot(JobState::Running, 30),
            snapshot(JobState::Completed, 100),
            snapshot(JobState::Completed, 100),
            failure(),
            snapshot(JobState::Completed, 100),
        ],
    );

    assert_eq!(navigations(&effects), 1);
    assert_eq!(state.controller(), ControllerState::Redirecting);
    assert!(!state.view().degraded);
}

#[test]
fn low_percent_completion_is_authoritative() {
    init_logging();
    let (state, effects) = run(
        tracker(),
        vec![
            snapshot(JobState::Running, 90),
            snapshot(JobState::Completed, 15),
        ],
    );

    assert_eq!(navigations(&effects), 1);
    let view = state.view();
    assert_eq!(view.state, JobState::Completed);
    assert_eq!(view.progress_percent, 15);
}

#[test]
fn percent_follows_latest_snapshot_even_when_lower() {
    init_logging();
    let (state, _) = run(
        tracker(),
        vec![
            snapshot(JobState::Running, 60),
            snapshot(JobState::Running, 45),
        ],
    );
    assert_eq!(state.view().progress_percent, 45);
}

#[test]
fn stale_snapshot_after_completion_is_ignored() {
    init_logging();
    let (state, _) = update(tracker(), snapshot(JobState::Completed, 100));
    let before = state.view();

    let (state, effects) = update(state, snapshot(JobState::Running, 70));

    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn server_failure_stops_without_redirect() {
    init_logging();
    let failed = StatusSnapshot::new(job(), JobState::Failed, 10).with_message("Agent crashed");
    let (state, effects) = run(
        tracker(),
        vec![snapshot(JobState::Running, 10), Msg::SnapshotReceived(failed)],
    );

    assert_eq!(effects, vec![Effect::StopPolling, Effect::StopSimulation]);
    let view = state.view();
    assert_eq!(view.state, JobState::Failed);
    assert_eq!(view.controller, ControllerState::Failed);
    assert_eq!(view.message.as_deref(), Some("Agent crashed"));

    let (_, effects) = update(state, snapshot(JobState::Completed, 100));
    assert!(effects.is_empty());
}

#[test]
fn unknown_server_state_keeps_tracking() {
    init_logging();
    let snapshot = StatusSnapshot::new(job(), JobState::parse("reticulating"), 33);
    let (state, effects) = update(tracker(), Msg::SnapshotReceived(snapshot));

    assert!(effects.is_empty());
    assert_eq!(state.controller(), ControllerState::Active);
    assert_eq!(state.view().state, JobState::Running);
}

#[test]
fn transient_failure_marks_degraded_and_keeps_last_snapshot() {
    init_logging();
    let agent = StatusSnapshot::new(job(), JobState::Running, 40).with_agent("Legal Analyst");
    let (state, effects) = run(tracker(), vec![Msg::SnapshotReceived(agent), failure()]);

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.degraded);
    assert_eq!(view.consecutive_failures, 1);
    assert_eq!(view.progress_percent, 40);
    assert_eq!(view.current_agent.as_deref(), Some("Legal Analyst"));
    assert_eq!(
        view.last_error.as_deref(),
        Some("network error: connection reset")
    );

    let (state, _) = update(state, snapshot(JobState::Running, 50));
    let view = state.view();
    assert!(!view.degraded);
    assert_eq!(view.last_error, None);
}

#[test]
fn failure_then_completion_redirects_once() {
    init_logging();
    let (state, effects) = run(
        tracker(),
        vec![failure(), failure(), snapshot(JobState::Completed, 100)],
    );

    assert_eq!(navigations(&effects), 1);
    assert_eq!(state.controller(), ControllerState::Redirecting);
}

#[test]
fn failure_streak_limit_gives_up() {
    init_logging();
    let config = TrackerConfig {
        max_consecutive_failures: Some(2),
        ..TrackerConfig::default()
    };
    let state = TrackerState::new(job(), config);

    let (state, effects) = update(state, failure());
    assert!(effects.is_empty());
    let (state, effects) = update(state, failure());
    assert_eq!(effects, vec![Effect::StopPolling, Effect::StopSimulation]);
    assert_eq!(state.controller(), ControllerState::GaveUp);

    let (state, effects) = update(state, snapshot(JobState::Completed, 100));
    assert!(effects.is_empty());
    assert_eq!(state.controller(), ControllerState::GaveUp);
}

#[test]
fn successful_poll_resets_failure_streak() {
    init_logging();
    let config = TrackerConfig {
        max_consecutive_failures: Some(2),
        ..TrackerConfig::default()
    };
    let (state, effects) = run(
        TrackerState::new(job(), config),
        vec![
            failure(),
            snapshot(JobState::Running, 10),
            failure(),
            snapshot(JobState::Running, 20),
        ],
    );

    assert!(effects.is_empty());
    assert_eq!(state.controller(), ControllerState::Active);
}

#[test]
fn deadline_gives_up_only_while_active() {
    init_logging();
    let (state, effects) = update(tracker(), Msg::DeadlineElapsed);
    assert_eq!(effects, vec![Effect::StopPolling, Effect::StopSimulation]);
    assert_eq!(state.controller(), ControllerState::GaveUp);

    let (state, _) = update(tracker(), snapshot(JobState::Completed, 100));
    let (state, effects) = update(state, Msg::DeadlineElapsed);
    assert!(effects.is_empty());
    assert_eq!(state.controller(), ControllerState::Redirecting);
}

#[test]
fn foreign_job_snapshot_is_ignored() {
    init_logging();
    let other = StatusSnapshot::new(JobId::new("someone-else").unwrap(), JobState::Completed, 100);
    let (state, effects) = update(tracker(), Msg::SnapshotReceived(other));

    assert!(effects.is_empty());
    assert_eq!(state.controller(), ControllerState::Active);
    assert!(state.latest().is_none());
}
