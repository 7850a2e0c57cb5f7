use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breath::{BreathPattern, Phase, PhaseChangeEvent, SimplifiedPhase};
use crate::paywall::SessionGate;

/// Every state change a host reports produces an Event.
/// The CLI prints them as JSON lines; a GUI would render them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        pattern: BreathPattern,
        gate: SessionGate,
        at: DateTime<Utc>,
    },
    SessionEnded {
        duration_ms: u64,
        breaths: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: SimplifiedPhase,
        /// Indicator text, e.g. "Breathe In".
        label: String,
        hold_duration_ms: u64,
        breath: u64,
        clock_ms: u64,
        at: DateTime<Utc>,
    },
    HoldCountdown {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PatternChanged {
        pattern: BreathPattern,
        at: DateTime<Utc>,
    },
    /// Free sessions are used up and there is no subscription.
    Paywalled {
        session_count: u64,
        free_limit: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        active: bool,
        phase: Phase,
        simplified_phase: SimplifiedPhase,
        phase_elapsed_ms: u64,
        phase_duration_ms: u64,
        fill_fraction: f64,
        foreground_palette_index: usize,
        background_palette_index: usize,
        pattern: BreathPattern,
        clock_ms: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn phase_changed(event: &PhaseChangeEvent, breath: u64, clock_ms: u64) -> Self {
        Event::PhaseChanged {
            phase: event.phase,
            label: event.phase.label().to_string(),
            hold_duration_ms: event.hold_duration_ms,
            breath,
            clock_ms,
            at: Utc::now(),
        }
    }

    pub fn hold_countdown(remaining_secs: u64) -> Self {
        Event::HoldCountdown {
            remaining_secs,
            at: Utc::now(),
        }
    }
}
