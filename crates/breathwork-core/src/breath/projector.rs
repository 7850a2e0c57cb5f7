//! Fill projection and palette swaps.
//!
//! The fill fraction is a pure function of the phase and its progress. Palette
//! swaps are looked up in a transition table keyed by `(from, to)` so the
//! swap only ever touches the layer that is fully hidden at that boundary.

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Project the fill fraction for `phase` at `progress` (0.0 ..= 1.0).
///
/// Hold phases return `held`, the fill at the moment the hold began.
pub fn project_fill(phase: Phase, progress: f64, held: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    match phase {
        Phase::Inhale => progress,
        Phase::Exhale => 1.0 - progress,
        Phase::HoldAfterInhale | Phase::HoldAfterExhale => held.clamp(0.0, 1.0),
    }
}

/// Side effect of a phase transition on the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteAction {
    None,
    /// Fill is at 0, so the foreground layer is hidden.
    AdvanceForeground,
    /// Fill is at 1, so the background layer is hidden.
    AdvanceBackground,
}

/// Palette action for a transition from `from` into `to`.
pub fn palette_action(from: Phase, to: Phase) -> PaletteAction {
    use Phase::*;
    match (from, to) {
        (Exhale | HoldAfterExhale, Inhale) => PaletteAction::AdvanceForeground,
        (Inhale | HoldAfterInhale, Exhale) => PaletteAction::AdvanceBackground,
        _ => PaletteAction::None,
    }
}

/// Foreground and background indices into a palette of `len` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteIndices {
    pub foreground: usize,
    pub background: usize,
    len: usize,
}

impl PaletteIndices {
    /// Foreground starts at 0 and background at 1 so the layers differ.
    ///
    /// A zero `len` is treated as a single-entry palette.
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            foreground: 0,
            background: 1 % len,
            len,
        }
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn apply(&mut self, action: PaletteAction) {
        match action {
            PaletteAction::None => {}
            PaletteAction::AdvanceForeground => {
                self.foreground = (self.foreground + 1) % self.len;
            }
            PaletteAction::AdvanceBackground => {
                self.background = (self.background + 1) % self.len;
            }
        }
    }
}
