mod clock;
mod countdown;
mod counter;
mod engine;
pub mod palette;
mod pattern;
mod phase;
mod projector;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::HoldCountdown;
pub use counter::BreathCounter;
pub use engine::{BreathEngine, ListenerId, OvershootPolicy, PhaseChangeEvent};
pub use palette::{Gradient, GRADIENTS, PALETTE_SIZE};
pub use pattern::{preset, BreathPattern, PatternPreset, PRESETS};
pub use phase::{Phase, SimplifiedPhase};
pub use projector::{palette_action, project_fill, PaletteAction, PaletteIndices};
