#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A poll returned a snapshot. Applied in receipt order.
    SnapshotReceived(crate::StatusSnapshot),
    /// A poll attempt failed; always transient from the controller's view.
    FetchFailed { error: String },
    /// Simulation timer fired.
    SimTick,
    /// The configured tracking duration ran out.
    DeadlineElapsed,
    /// Owner is going away; tear everything down.
    Unmount,
}
