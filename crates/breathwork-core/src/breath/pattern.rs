use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::error::ConfigError;

/// Phase durations of one breath cycle, in milliseconds.
///
/// Durations are unsigned, so a negative value can only arrive through
/// [`BreathPattern::from_signed`] or deserialization, both of which reject it.
/// An all-zero pattern can be represented but is refused by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignedPattern")]
pub struct BreathPattern {
    pub inhale_ms: u64,
    pub hold_after_inhale_ms: u64,
    pub exhale_ms: u64,
    pub hold_after_exhale_ms: u64,
}

/// Wire form used while deserializing, so negative input is reported rather
/// than failing with an opaque integer-range error.
#[derive(Deserialize)]
struct SignedPattern {
    inhale_ms: i64,
    #[serde(default)]
    hold_after_inhale_ms: i64,
    exhale_ms: i64,
    #[serde(default)]
    hold_after_exhale_ms: i64,
}

impl TryFrom<SignedPattern> for BreathPattern {
    type Error = ConfigError;

    fn try_from(raw: SignedPattern) -> Result<Self, Self::Error> {
        BreathPattern::from_signed(
            raw.inhale_ms,
            raw.hold_after_inhale_ms,
            raw.exhale_ms,
            raw.hold_after_exhale_ms,
        )
    }
}

impl BreathPattern {
    pub const fn new(
        inhale_ms: u64,
        hold_after_inhale_ms: u64,
        exhale_ms: u64,
        hold_after_exhale_ms: u64,
    ) -> Self {
        Self {
            inhale_ms,
            hold_after_inhale_ms,
            exhale_ms,
            hold_after_exhale_ms,
        }
    }

    /// Build a pattern from signed input such as CLI arguments or config values.
    ///
    /// # Errors
    /// Returns [`ConfigError::NegativeDuration`] for the first negative phase.
    /// Zero-only patterns are accepted here; see [`BreathPattern::validate`].
    pub fn from_signed(
        inhale_ms: i64,
        hold_after_inhale_ms: i64,
        exhale_ms: i64,
        hold_after_exhale_ms: i64,
    ) -> Result<Self, ConfigError> {
        let checked = |phase: Phase, value_ms: i64| {
            u64::try_from(value_ms).map_err(|_| ConfigError::NegativeDuration { phase, value_ms })
        };
        Ok(Self {
            inhale_ms: checked(Phase::Inhale, inhale_ms)?,
            hold_after_inhale_ms: checked(Phase::HoldAfterInhale, hold_after_inhale_ms)?,
            exhale_ms: checked(Phase::Exhale, exhale_ms)?,
            hold_after_exhale_ms: checked(Phase::HoldAfterExhale, hold_after_exhale_ms)?,
        })
    }

    /// Check that the pattern can drive the engine.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyPattern`] when every duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_ms() == 0 {
            return Err(ConfigError::EmptyPattern);
        }
        Ok(())
    }

    pub fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Inhale => self.inhale_ms,
            Phase::HoldAfterInhale => self.hold_after_inhale_ms,
            Phase::Exhale => self.exhale_ms,
            Phase::HoldAfterExhale => self.hold_after_exhale_ms,
        }
    }

    /// Length of one full cycle. Skipped holds contribute zero either way.
    pub fn cycle_ms(&self) -> u64 {
        self.inhale_ms
            .saturating_add(self.hold_after_inhale_ms)
            .saturating_add(self.exhale_ms)
            .saturating_add(self.hold_after_exhale_ms)
    }

    /// Phases actually entered during one cycle, in order, starting at Inhale.
    pub fn active_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| !p.is_hold() || self.duration_of(*p) > 0)
            .collect()
    }
}

impl Default for BreathPattern {
    /// Four seconds in, four seconds out, no holds.
    fn default() -> Self {
        Self::new(4000, 0, 4000, 0)
    }
}

/// A named pattern offered to the user.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PatternPreset {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub pattern: BreathPattern,
}

pub const PRESETS: [PatternPreset; 5] = [
    PatternPreset {
        slug: "resonant",
        name: "Resonant Breathing",
        description: "5.5 seconds each, optimal for heart rate variability",
        pattern: BreathPattern::new(5500, 0, 5500, 0),
    },
    PatternPreset {
        slug: "relaxing",
        name: "Relaxing Breath",
        description: "4 in, 6 out, activates the parasympathetic system",
        pattern: BreathPattern::new(4000, 0, 6000, 0),
    },
    PatternPreset {
        slug: "box",
        name: "Box Breathing",
        description: "4 seconds each side of the box",
        pattern: BreathPattern::new(4000, 4000, 4000, 4000),
    },
    PatternPreset {
        slug: "four-seven-eight",
        name: "4-7-8 Breath",
        description: "4 in, hold 7, 8 out, a calming breath",
        pattern: BreathPattern::new(4000, 7000, 8000, 0),
    },
    PatternPreset {
        slug: "energizing",
        name: "Energizing Breath",
        description: "Fast and equal, increases alertness",
        pattern: BreathPattern::new(2000, 0, 2000, 0),
    },
];

/// Look up a preset by slug.
///
/// # Errors
/// Returns [`ConfigError::UnknownPreset`] if no preset has that slug.
pub fn preset(slug: &str) -> Result<&'static PatternPreset, ConfigError> {
    PRESETS
        .iter()
        .find(|p| p.slug.eq_ignore_ascii_case(slug))
        .ok_or_else(|| ConfigError::UnknownPreset(slug.to_string()))
}
