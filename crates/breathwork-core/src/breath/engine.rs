//! Breath phase engine.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads or timers - the host calls `tick()` once per animation frame and
//! renders whatever fill and palette indices the engine reports.
//!
//! ## Phase Cycle
//!
//! ```text
//! Inhale -> [HoldAfterInhale] -> Exhale -> [HoldAfterExhale] -> Inhale ...
//! ```
//!
//! Bracketed holds are skipped when their duration is zero.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathEngine::new(SystemClock::new());
//! engine.start(BreathPattern::default())?;
//! // Once per frame:
//! if let Some(event) = engine.tick_now() { /* update display */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::palette::PALETTE_SIZE;
use super::pattern::BreathPattern;
use super::phase::{Phase, SimplifiedPhase};
use super::projector::{palette_action, project_fill, PaletteAction, PaletteIndices};
use crate::error::ConfigError;
use crate::events::Event;

/// What happens to time spent past the end of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OvershootPolicy {
    /// The next phase starts at the tick that ended the previous one.
    #[default]
    Drop,
    /// The next phase starts where the previous one should have ended.
    Carry,
}

/// Emitted whenever the engine enters a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChangeEvent {
    pub phase: SimplifiedPhase,
    /// Duration of the hold being entered; zero for inhale and exhale.
    pub hold_duration_ms: u64,
}

impl PhaseChangeEvent {
    pub fn entering(phase: Phase, pattern: &BreathPattern) -> Self {
        let hold_duration_ms = if phase.is_hold() {
            pattern.duration_of(phase)
        } else {
            0
        };
        Self {
            phase: phase.simplified(),
            hold_duration_ms,
        }
    }
}

/// Per-run state. Exists only while the engine is active.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EngineState {
    phase: Phase,
    phase_started_at_ms: u64,
    fill_fraction: f64,
    palette: PaletteIndices,
}

impl EngineState {
    fn fresh(now_ms: u64, palette_size: usize) -> Self {
        Self {
            phase: Phase::Inhale,
            phase_started_at_ms: now_ms,
            fill_fraction: 0.0,
            palette: PaletteIndices::new(palette_size),
        }
    }
}

/// Handle returned by [`BreathEngine::on_phase_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&PhaseChangeEvent)>;

/// Core breath engine.
///
/// Operates on timestamps supplied by the host or read from `C`.
pub struct BreathEngine<C: Clock> {
    clock: C,
    pattern: BreathPattern,
    palette_size: usize,
    overshoot: OvershootPolicy,
    /// `None` while stopped; replaced wholesale by `start`.
    state: Option<EngineState>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
}

impl<C: Clock> BreathEngine<C> {
    /// Create a stopped engine with the default pattern and palette.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            pattern: BreathPattern::default(),
            palette_size: PALETTE_SIZE,
            overshoot: OvershootPolicy::default(),
            state: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn with_palette_size(mut self, palette_size: usize) -> Self {
        self.palette_size = palette_size.max(1);
        self
    }

    pub fn with_overshoot(mut self, overshoot: OvershootPolicy) -> Self {
        self.overshoot = overshoot;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn pattern(&self) -> &BreathPattern {
        &self.pattern
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn current_phase(&self) -> Phase {
        self.state.map(|s| s.phase).unwrap_or(Phase::Inhale)
    }

    pub fn fill_fraction(&self) -> f64 {
        self.state.map(|s| s.fill_fraction).unwrap_or(0.0)
    }

    pub fn foreground_palette_index(&self) -> usize {
        self.palette().foreground
    }

    pub fn background_palette_index(&self) -> usize {
        self.palette().background
    }

    fn palette(&self) -> PaletteIndices {
        self.state
            .map(|s| s.palette)
            .unwrap_or_else(|| PaletteIndices::new(self.palette_size))
    }

    /// Milliseconds spent in the current phase as of `now_ms`.
    pub fn phase_elapsed_ms(&self, now_ms: u64) -> u64 {
        self.state
            .map(|s| now_ms.saturating_sub(s.phase_started_at_ms))
            .unwrap_or(0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let phase = self.current_phase();
        let now_ms = self.clock.now_ms();
        Event::StateSnapshot {
            active: self.is_active(),
            phase,
            simplified_phase: phase.simplified(),
            phase_elapsed_ms: self.phase_elapsed_ms(now_ms),
            phase_duration_ms: self.pattern.duration_of(phase),
            fill_fraction: self.fill_fraction(),
            foreground_palette_index: self.foreground_palette_index(),
            background_palette_index: self.background_palette_index(),
            pattern: self.pattern,
            clock_ms: now_ms,
            at: Utc::now(),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a callback invoked for every emitted [`PhaseChangeEvent`].
    pub fn on_phase_change(&mut self, listener: impl FnMut(&PhaseChangeEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if no listener had that id.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: &PhaseChangeEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) at Inhale with an empty fill.
    ///
    /// Any previous run state is discarded. Emits the initial inhale event.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyPattern`] if every duration is zero; the
    /// current run, if any, is left untouched.
    pub fn start(&mut self, pattern: BreathPattern) -> Result<PhaseChangeEvent, ConfigError> {
        if let Err(e) = pattern.validate() {
            warn!(?pattern, error = %e, "refusing to start breath engine");
            return Err(e);
        }
        let now_ms = self.clock.now_ms();
        self.pattern = pattern;
        self.state = Some(EngineState::fresh(now_ms, self.palette_size));
        info!(?pattern, now_ms, "breath engine started");

        let event = PhaseChangeEvent::entering(Phase::Inhale, &self.pattern);
        self.notify(&event);
        Ok(event)
    }

    /// Stop and discard run state. A no-op when already stopped.
    pub fn stop(&mut self) {
        if self.state.take().is_some() {
            info!("breath engine stopped");
        }
    }

    /// Replace the pattern without touching the current phase or its start.
    ///
    /// The new durations apply from the next tick, so a shorter duration can
    /// complete the current phase on that tick.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyPattern`] and keeps the old pattern.
    pub fn set_pattern(&mut self, pattern: BreathPattern) -> Result<(), ConfigError> {
        if let Err(e) = pattern.validate() {
            warn!(?pattern, error = %e, "rejected breath pattern");
            return Err(e);
        }
        info!(?pattern, active = self.is_active(), "breath pattern changed");
        self.pattern = pattern;
        Ok(())
    }

    /// Advance using the engine's own clock.
    pub fn tick_now(&mut self) -> Option<PhaseChangeEvent> {
        let now_ms = self.clock.now_ms();
        self.tick(now_ms)
    }

    /// Advance to `now_ms`. Call once per frame.
    ///
    /// Returns the event for the phase entered, if this tick completed the
    /// current one. At most one transition happens per tick. A no-op while
    /// stopped.
    pub fn tick(&mut self, now_ms: u64) -> Option<PhaseChangeEvent> {
        let state = self.state.as_mut()?;

        let elapsed = now_ms.saturating_sub(state.phase_started_at_ms);
        let duration = self.pattern.duration_of(state.phase);
        let progress = if duration == 0 {
            1.0
        } else {
            (elapsed as f64 / duration as f64).min(1.0)
        };
        state.fill_fraction = project_fill(state.phase, progress, state.fill_fraction);

        if progress < 1.0 {
            return None;
        }

        let from = state.phase;
        let to = from.successor(&self.pattern);
        let action = palette_action(from, to);
        state.palette.apply(action);
        state.phase = to;
        state.phase_started_at_ms = match self.overshoot {
            OvershootPolicy::Drop => now_ms,
            OvershootPolicy::Carry => state
                .phase_started_at_ms
                .saturating_add(duration)
                .min(now_ms),
        };

        if action != PaletteAction::None {
            debug!(
                ?action,
                foreground = state.palette.foreground,
                background = state.palette.background,
                "palette advanced"
            );
        }
        debug!(?from, ?to, now_ms, overshoot_ms = elapsed.saturating_sub(duration), "phase transition");

        let event = PhaseChangeEvent::entering(to, &self.pattern);
        self.notify(&event);
        Some(event)
    }
}

impl<C: Clock + std::fmt::Debug> std::fmt::Debug for BreathEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreathEngine")
            .field("clock", &self.clock)
            .field("pattern", &self.pattern)
            .field("palette_size", &self.palette_size)
            .field("overshoot", &self.overshoot)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breath::clock::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    const BOX: BreathPattern = BreathPattern::new(4000, 4000, 4000, 4000);

    fn engine_at_zero() -> (BreathEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        (BreathEngine::new(clock.clone()), clock)
    }

    #[test]
    fn start_emits_initial_inhale() {
        let (mut engine, _) = engine_at_zero();
        let event = engine.start(BOX).unwrap();
        assert_eq!(
            event,
            PhaseChangeEvent {
                phase: SimplifiedPhase::Inhale,
                hold_duration_ms: 0
            }
        );
        assert!(engine.is_active());
        assert_eq!(engine.current_phase(), Phase::Inhale);
        assert_eq!(engine.fill_fraction(), 0.0);
    }

    #[test]
    fn box_breathing_scenario() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BOX).unwrap();

        assert!(engine.tick(2000).is_none());
        assert_eq!(engine.fill_fraction(), 0.5);

        let ev = engine.tick(4000).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Hold);
        assert_eq!(ev.hold_duration_ms, 4000);
        assert_eq!(engine.current_phase(), Phase::HoldAfterInhale);
        assert_eq!(engine.fill_fraction(), 1.0);

        assert!(engine.tick(6000).is_none());
        assert_eq!(engine.fill_fraction(), 1.0);

        let ev = engine.tick(8000).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Exhale);
        assert_eq!(engine.current_phase(), Phase::Exhale);
        assert_eq!(engine.fill_fraction(), 1.0);
        assert!(engine.tick(9000).is_none());
        assert_eq!(engine.fill_fraction(), 0.75);

        let ev = engine.tick(12000).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Hold);
        assert_eq!(engine.current_phase(), Phase::HoldAfterExhale);
        assert_eq!(engine.fill_fraction(), 0.0);

        let fg_before = engine.foreground_palette_index();
        let ev = engine.tick(16000).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Inhale);
        assert_eq!(engine.current_phase(), Phase::Inhale);
        assert_eq!(
            engine.foreground_palette_index(),
            (fg_before + 1) % PALETTE_SIZE
        );
    }

    #[test]
    fn zero_hold_after_inhale_goes_straight_to_exhale() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BreathPattern::new(4000, 0, 4000, 4000)).unwrap();
        let ev = engine.tick(4000).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Exhale);
        assert_eq!(engine.current_phase(), Phase::Exhale);
    }

    #[test]
    fn reconfigure_applies_to_current_phase_without_reset() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BreathPattern::new(4000, 0, 4000, 0)).unwrap();
        assert!(engine.tick(500).is_none());
        assert_eq!(engine.fill_fraction(), 0.125);

        engine.set_pattern(BreathPattern::new(1000, 0, 4000, 0)).unwrap();
        assert_eq!(engine.current_phase(), Phase::Inhale);

        assert!(engine.tick(500).is_none());
        assert_eq!(engine.fill_fraction(), 0.5);
        assert!(engine.tick(1000).is_some());
        assert_eq!(engine.current_phase(), Phase::Exhale);
    }

    #[test]
    fn shorter_duration_forces_transition_on_next_tick() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BreathPattern::new(4000, 0, 4000, 0)).unwrap();
        engine.tick(3000);
        engine.set_pattern(BreathPattern::new(1000, 0, 4000, 0)).unwrap();
        let ev = engine.tick(3001).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Exhale);
        assert_eq!(engine.fill_fraction(), 1.0);
    }

    #[test]
    fn stop_resets_readable_state() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BOX).unwrap();
        engine.tick(4000);
        engine.tick(8000);
        engine.tick(9000);
        engine.stop();
        assert!(!engine.is_active());
        assert_eq!(engine.fill_fraction(), 0.0);
        assert_eq!(engine.current_phase(), Phase::Inhale);
        assert_eq!(engine.background_palette_index(), 1);
    }

    #[test]
    fn tick_after_stop_is_silent() {
        let (mut engine, _) = engine_at_zero();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        engine.on_phase_change(move |e| sink.borrow_mut().push(*e));

        engine.start(BOX).unwrap();
        engine.stop();
        engine.stop();
        assert!(engine.tick(100_000).is_none());
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn restart_begins_at_inhale_with_empty_fill() {
        let (mut engine, clock) = engine_at_zero();
        engine.start(BOX).unwrap();
        engine.tick(4000);
        engine.tick(8000);
        engine.stop();
        clock.set(20_000);
        engine.start(BOX).unwrap();
        assert_eq!(engine.current_phase(), Phase::Inhale);
        assert_eq!(engine.fill_fraction(), 0.0);
        assert!(engine.tick(23_000).is_none());
        assert_eq!(engine.fill_fraction(), 0.75);
    }

    #[test]
    fn empty_pattern_is_refused() {
        let (mut engine, _) = engine_at_zero();
        let err = engine.start(BreathPattern::new(0, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPattern));
        assert!(!engine.is_active());

        engine.start(BOX).unwrap();
        assert!(engine.set_pattern(BreathPattern::new(0, 0, 0, 0)).is_err());
        assert_eq!(*engine.pattern(), BOX);
    }

    #[test]
    fn listeners_receive_every_event_until_removed() {
        let (mut engine, _) = engine_at_zero();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let id = engine.on_phase_change(move |e| sink.borrow_mut().push(e.phase));

        engine.start(BreathPattern::new(1000, 0, 1000, 0)).unwrap();
        engine.tick(1000);
        engine.tick(2000);
        assert_eq!(
            *events.borrow(),
            vec![
                SimplifiedPhase::Inhale,
                SimplifiedPhase::Exhale,
                SimplifiedPhase::Inhale
            ]
        );

        assert!(engine.remove_listener(id));
        assert!(!engine.remove_listener(id));
        engine.tick(3000);
        assert_eq!(events.borrow().len(), 3);
    }

    #[test]
    fn overshoot_is_dropped_by_default() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BreathPattern::new(1000, 0, 1000, 0)).unwrap();
        engine.tick(1400);
        assert!(engine.tick(2300).is_none());
        assert_eq!(engine.phase_elapsed_ms(2300), 900);
    }

    #[test]
    fn carry_policy_keeps_overshoot() {
        let clock = ManualClock::new(0);
        let mut engine = BreathEngine::new(clock).with_overshoot(OvershootPolicy::Carry);
        engine.start(BreathPattern::new(1000, 0, 1000, 0)).unwrap();
        engine.tick(1400);
        assert_eq!(engine.phase_elapsed_ms(1400), 400);
        assert!(engine.tick(2000).is_some());
        assert_eq!(engine.current_phase(), Phase::Inhale);
    }

    #[test]
    fn background_advances_when_exhale_begins() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BOX).unwrap();
        assert_eq!(engine.background_palette_index(), 1);
        engine.tick(4000);
        assert_eq!(engine.background_palette_index(), 1);
        engine.tick(8000);
        assert_eq!(engine.background_palette_index(), 2);
        assert_eq!(engine.foreground_palette_index(), 0);
    }

    #[test]
    fn zero_duration_phases_take_one_tick_each() {
        let (mut engine, _) = engine_at_zero();
        engine.start(BreathPattern::new(0, 1000, 0, 0)).unwrap();
        let ev = engine.tick(0).unwrap();
        assert_eq!(ev.phase, SimplifiedPhase::Hold);
        assert_eq!(engine.fill_fraction(), 1.0);
        assert!(engine.tick(999).is_none());
        assert_eq!(engine.tick(1000).unwrap().phase, SimplifiedPhase::Exhale);
        assert_eq!(engine.tick(1000).unwrap().phase, SimplifiedPhase::Inhale);
    }

    #[test]
    fn set_pattern_while_stopped_only_stores_it() {
        let (mut engine, _) = engine_at_zero();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        engine.on_phase_change(move |e| sink.borrow_mut().push(*e));

        engine.set_pattern(BOX).unwrap();
        assert_eq!(*engine.pattern(), BOX);
        assert!(!engine.is_active());
        assert!(engine.tick(100_000).is_none());
        assert!(events.borrow().is_empty());

        let stored = *engine.pattern();
        let first = engine.start(stored).unwrap();
        assert_eq!(first.phase, SimplifiedPhase::Inhale);
        assert!(engine.tick(4000).is_some());
        assert_eq!(engine.current_phase(), Phase::HoldAfterInhale);
    }

    #[test]
    fn small_palette_wraps_over_box_cycles() {
        let clock = ManualClock::new(0);
        let mut engine = BreathEngine::new(clock).with_palette_size(2);
        engine.start(BOX).unwrap();
        assert_eq!(
            (engine.foreground_palette_index(), engine.background_palette_index()),
            (0, 1)
        );

        let mut seen = Vec::new();
        for t in (4000..=32_000).step_by(4000) {
            engine.tick(t);
            seen.push((engine.foreground_palette_index(), engine.background_palette_index()));
        }
        assert_eq!(
            seen,
            vec![(0, 1), (0, 0), (0, 0), (1, 0), (1, 0), (1, 1), (1, 1), (0, 1)]
        );
    }

    #[test]
    fn zero_palette_size_is_clamped_to_one() {
        let clock = ManualClock::new(0);
        let mut engine = BreathEngine::new(clock).with_palette_size(0);
        engine.start(BOX).unwrap();
        for t in (4000..=16_000).step_by(4000) {
            engine.tick(t);
            assert_eq!(engine.foreground_palette_index(), 0);
            assert_eq!(engine.background_palette_index(), 0);
        }
    }

    #[test]
    fn snapshot_reports_stopped_engine() {
        let (engine, _) = engine_at_zero();
        match engine.snapshot() {
            Event::StateSnapshot {
                active,
                phase,
                fill_fraction,
                ..
            } => {
                assert!(!active);
                assert_eq!(phase, Phase::Inhale);
                assert_eq!(fill_fraction, 0.0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
