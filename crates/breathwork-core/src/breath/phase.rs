use serde::{Deserialize, Serialize};

use super::pattern::BreathPattern;

/// One of the four internal phases of a breath cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Inhale,
    HoldAfterInhale,
    Exhale,
    HoldAfterExhale,
}

/// The three phases a display cares about. Both holds collapse into `Hold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimplifiedPhase {
    Inhale,
    Exhale,
    Hold,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Inhale,
        Phase::HoldAfterInhale,
        Phase::Exhale,
        Phase::HoldAfterExhale,
    ];

    /// The phase that follows `self` under `pattern`.
    ///
    /// Hold phases with a zero duration are never entered. Inhale and Exhale
    /// are always entered, even when their own duration is zero.
    pub fn successor(self, pattern: &BreathPattern) -> Phase {
        match self {
            Phase::Inhale if pattern.hold_after_inhale_ms > 0 => Phase::HoldAfterInhale,
            Phase::Inhale | Phase::HoldAfterInhale => Phase::Exhale,
            Phase::Exhale if pattern.hold_after_exhale_ms > 0 => Phase::HoldAfterExhale,
            Phase::Exhale | Phase::HoldAfterExhale => Phase::Inhale,
        }
    }

    pub fn simplified(self) -> SimplifiedPhase {
        match self {
            Phase::Inhale => SimplifiedPhase::Inhale,
            Phase::Exhale => SimplifiedPhase::Exhale,
            Phase::HoldAfterInhale | Phase::HoldAfterExhale => SimplifiedPhase::Hold,
        }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, Phase::HoldAfterInhale | Phase::HoldAfterExhale)
    }
}

impl SimplifiedPhase {
    /// Display text for the phase indicator.
    pub fn label(self) -> &'static str {
        match self {
            SimplifiedPhase::Inhale => "Breathe In",
            SimplifiedPhase::Exhale => "Breathe Out",
            SimplifiedPhase::Hold => "Hold",
        }
    }
}
