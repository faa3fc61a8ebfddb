//! Simulated phase clock.
//!
//! The simulator advances one qualitative phase per tick but never past the last
//! non-terminal phase. Only [`ProgressSimulator::force_final`] reaches the final phase,
//! and the controller calls it solely when a real `completed` snapshot arrives.

pub type PhaseIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSimulator {
    phase_count: usize,
    index: PhaseIndex,
    stopped: bool,
}

impl ProgressSimulator {
    /// `phase_count` below 2 is raised to 2 so the ceiling is always a valid index.
    pub fn new(phase_count: usize) -> Self {
        Self {
            phase_count: phase_count.max(2),
            index: 0,
            stopped: false,
        }
    }

    pub fn phase_count(&self) -> usize {
        self.phase_count
    }

    pub fn index(&self) -> PhaseIndex {
        self.index
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_final(&self) -> bool {
        self.index == self.final_index()
    }

    pub fn ceiling(&self) -> PhaseIndex {
        self.phase_count - 2
    }

    pub fn final_index(&self) -> PhaseIndex {
        self.phase_count - 1
    }

    /// Advances by one phase. Returns the new index if it moved.
    pub fn tick(&mut self) -> Option<PhaseIndex> {
        if self.stopped || self.index >= self.ceiling() {
            return None;
        }
        self.index += 1;
        Some(self.index)
    }

    /// Jumps to the final phase and stops. Returns `false` if already there.
    pub fn force_final(&mut self) -> bool {
        self.stopped = true;
        if self.is_final() {
            return false;
        }
        self.index = self.final_index();
        true
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
