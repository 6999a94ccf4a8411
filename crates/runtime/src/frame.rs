use std::time::Duration;

use crate::budget::TimeBudget;

/// Metadata for one host tick.
///
/// The host calls into the pipeline once per tick with the time it is
/// willing to spend; the index stamps emitted events.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tick {
    /// 0-based tick index.
    pub index: u64,
    /// Wall-clock allowance for this tick.
    pub budget: Duration,
}

impl Tick {
    pub fn new(index: u64, budget: Duration) -> Self {
        Self { index, budget }
    }

    pub fn next(self, budget: Duration) -> Self {
        Self::new(self.index + 1, budget)
    }

    /// Starts the wall clock for this tick.
    pub fn start_budget(&self) -> TimeBudget {
        TimeBudget::new(self.budget)
    }
}
