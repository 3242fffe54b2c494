use crate::telemetry::Snapshot;

/// Remembers the tick of the first snapshot seen in a session and reports
/// every later tick relative to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaselineTracker {
    baseline: Option<u64>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the baseline on first use and returns the relative tick.
    ///
    /// The result goes negative if the device tick ever moves backwards; that
    /// is reported as-is. The difference is taken modulo 2^64, so it never
    /// overflows.
    pub fn observe(&mut self, snapshot: &Snapshot) -> i64 {
        let baseline = *self.baseline.get_or_insert(snapshot.tick);
        snapshot.tick.wrapping_sub(baseline) as i64
    }

    pub fn baseline(&self) -> Option<u64> {
        self.baseline
    }

    pub fn reset(&mut self) {
        self.baseline = None;
    }
}
