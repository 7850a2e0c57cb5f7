//! # Breathwork Core Library
//!
//! This library provides the core logic for the Breathwork guidance app.
//! All behaviour is available through the standalone CLI binary; a GUI would
//! be a thin display layer over the same core library.
//!
//! ## Architecture
//!
//! - **Breath Engine**: A tick-driven state machine that requires the caller
//!   to invoke `tick()` once per frame for fill and phase updates
//! - **Paywall**: Free-session counting and subscription gating, consulted by
//!   the host before a session starts
//! - **Storage**: SQLite-backed session count and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`BreathEngine`]: Phase scheduler and fill projector
//! - [`HoldCountdown`]: Whole-second countdown shown during holds
//! - [`Paywall`]: Session gate over a [`SessionCounter`]
//! - [`Config`]: Application configuration management

pub mod breath;
pub mod error;
pub mod events;
pub mod paywall;
pub mod storage;

pub use breath::{
    BreathCounter, BreathEngine, BreathPattern, Clock, HoldCountdown, ManualClock,
    OvershootPolicy, Phase, PhaseChangeEvent, SimplifiedPhase, SystemClock,
};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use paywall::{
    Access, InMemorySessionCounter, Paywall, SessionCounter, SessionGate, StaticSubscription,
    SubscriptionStatus,
};
pub use storage::{Config, Database, SessionStore};
