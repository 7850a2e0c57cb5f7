//! Whole-second countdown shown during holds.
//!
//! Driven by the host's one-second interval, not by animation frames, and
//! never fed back into the engine.

use super::engine::PhaseChangeEvent;
use super::phase::SimplifiedPhase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldCountdown {
    remaining_secs: Option<u64>,
}

impl HoldCountdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm on a hold event, clear on anything else.
    ///
    /// Returns the value to display, if any.
    pub fn observe(&mut self, event: &PhaseChangeEvent) -> Option<u64> {
        self.remaining_secs = match event.phase {
            SimplifiedPhase::Hold => Some(event.hold_duration_ms.div_ceil(1000)),
            SimplifiedPhase::Inhale | SimplifiedPhase::Exhale => None,
        };
        self.remaining_secs
    }

    /// One interval elapsed. Returns the new value if it changed.
    pub fn tick(&mut self) -> Option<u64> {
        match self.remaining_secs {
            Some(secs) if secs > 0 => {
                self.remaining_secs = Some(secs - 1);
                self.remaining_secs
            }
            _ => None,
        }
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.remaining_secs
    }

    pub fn clear(&mut self) {
        self.remaining_secs = None;
    }
}
