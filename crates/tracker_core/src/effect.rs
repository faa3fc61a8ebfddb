#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StopPolling,
    StopSimulation,
    /// Send the user to the finished report. Emitted at most once per tracker.
    Navigate {
        job_id: crate::JobId,
        location: String,
    },
}
