use serde::{Deserialize, Serialize};

/// Position of a call in the externally sequenced call order.
///
/// The engine never reads the wall clock. Every mutating call advances the
/// clock by one tick, so `LogicalTime` orders requests the same way the
/// external sequencer ordered the calls that opened them.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalTime(pub u64);

impl LogicalTime {
    /// Advances the clock and returns the new tick.
    pub fn tick(&mut self) -> LogicalTime {
        self.0 = self.0.saturating_add(1);
        *self
    }
}

impl std::fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}
