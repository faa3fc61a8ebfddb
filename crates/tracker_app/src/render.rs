use chrono::{DateTime, TimeZone};
use tracker_core::{ControllerState, JobState, PhaseStatus, TrackerViewModel};

const BAR_WIDTH: usize = 30;

/// Formats one view model as a block of terminal text.
pub fn render<Tz>(view: &TrackerViewModel, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut lines = Vec::with_capacity(view.phases.len() + 4);

    lines.push(format!(
        "[{}] job {} | {} | {}",
        now.format("%H:%M:%S"),
        view.job_id,
        state_label(view),
        view.message.as_deref().unwrap_or("Analyzing your policy...")
    ));
    lines.push(format!(
        "  {} {:>3}%",
        progress_bar(view.progress_percent),
        view.progress_percent
    ));
    if let Some(agent) = &view.current_agent {
        lines.push(format!("  Current agent: {agent}"));
    }
    // The last simulated phase is where the agents run.
    let agent_row = view.phases.len().saturating_sub(2);
    for (index, row) in view.phases.iter().enumerate() {
        let marker = match row.status {
            PhaseStatus::Completed => "[x]",
            PhaseStatus::Active => "[>]",
            PhaseStatus::Pending => "[ ]",
        };
        match (&view.current_agent, row.status) {
            (Some(agent), PhaseStatus::Active) if index == agent_row => {
                lines.push(format!("  {marker} {} (Agent: {agent})", row.label))
            }
            _ => lines.push(format!("  {marker} {}", row.label)),
        }
    }
    if view.degraded {
        lines.push(format!(
            "  ! status unavailable ({} attempt(s)): {}",
            view.consecutive_failures,
            view.last_error.as_deref().unwrap_or("unknown error")
        ));
    }

    lines.join("\n")
}

fn state_label(view: &TrackerViewModel) -> &'static str {
    match (view.controller, view.state) {
        (ControllerState::GaveUp, _) => "stopped",
        (_, JobState::Queued) => "queued",
        (_, JobState::Running) => "running",
        (_, JobState::Completed) => "completed",
        (_, JobState::Failed) => "failed",
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
