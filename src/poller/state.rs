use crate::telemetry::{FetchError, Snapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollStatus {
    #[default]
    Idle,
    Polling,
    Halted,
}

#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub status: PollStatus,
    pub last_snapshot: Option<Snapshot>,
    /// Message of the failure that halted the run; present iff an error was seen.
    pub last_error: Option<String>,
    /// Identifies the current run so late completions from an earlier one are
    /// ignored.
    pub generation: u64,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// Enters `Polling` for a fresh run and returns its generation.
    pub fn begin_run(&mut self) -> u64 {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            status: PollStatus::Polling,
            last_snapshot: None,
            last_error: None,
            generation,
        };
        generation
    }

    fn accepts(&self, generation: u64) -> bool {
        self.status == PollStatus::Polling && self.generation == generation
    }

    /// Stores a snapshot if the run is still live. Returns whether it was applied.
    pub fn record_snapshot(&mut self, generation: u64, snapshot: Snapshot) -> bool {
        if !self.accepts(generation) {
            return false;
        }
        self.last_snapshot = Some(snapshot);
        true
    }

    /// Moves a live run to `Halted`, keeping the last good snapshot. Returns
    /// whether the transition happened.
    pub fn halt(&mut self, generation: u64, error: &FetchError) -> bool {
        if !self.accepts(generation) {
            return false;
        }
        self.status = PollStatus::Halted;
        self.last_error = Some(error.to_string());
        true
    }

    /// Back to `Idle`. The generation is bumped so nothing from the old run
    /// can land afterwards.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }
}
