use super::engine::PhaseChangeEvent;
use super::phase::SimplifiedPhase;

/// Breath number shown while a session runs.
///
/// Call [`BreathCounter::begin`] alongside `start` instead of feeding it the
/// initial inhale event, then [`BreathCounter::observe`] every event a tick
/// returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreathCounter {
    count: u64,
}

impl BreathCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.count = 1;
    }

    pub fn observe(&mut self, event: &PhaseChangeEvent) {
        if self.count > 0 && event.phase == SimplifiedPhase::Inhale {
            self.count += 1;
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Breaths that have fully finished.
    pub fn completed_cycles(&self) -> u64 {
        self.count.saturating_sub(1)
    }
}
