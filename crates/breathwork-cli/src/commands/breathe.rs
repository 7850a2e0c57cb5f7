use std::time::Duration;

use breathwork_core::breath::preset;
use breathwork_core::storage::EngineConfig;
use breathwork_core::{
    Access, BreathCounter, BreathEngine, BreathPattern, Clock, Config, ConfigError, Database,
    Event, HoldCountdown, ManualClock, Paywall, SessionCounter, SessionStore, StaticSubscription,
    SystemClock,
};
use chrono::Utc;
use clap::{Args, Subcommand};
use tokio::time::{self, MissedTickBehavior};

use super::emit;

/// Pattern selection. Anything left out falls back to the config file.
#[derive(Args, Debug, Default)]
pub struct PatternArgs {
    /// Preset slug (see `pattern list`)
    #[arg(long, conflicts_with_all = ["inhale_ms", "hold_in_ms", "exhale_ms", "hold_out_ms"])]
    preset: Option<String>,
    /// Inhale duration in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    inhale_ms: Option<i64>,
    /// Hold after inhale in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    hold_in_ms: Option<i64>,
    /// Exhale duration in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    exhale_ms: Option<i64>,
    /// Hold after exhale in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    hold_out_ms: Option<i64>,
}

impl PatternArgs {
    fn resolve(&self, config: &Config) -> Result<BreathPattern, ConfigError> {
        let mut pattern = config.pattern.clone();
        if let Some(slug) = &self.preset {
            pattern.preset = Some(slug.clone());
        }
        let explicit = [self.inhale_ms, self.hold_in_ms, self.exhale_ms, self.hold_out_ms];
        if explicit.iter().any(Option::is_some) {
            pattern.preset = None;
        }
        pattern.inhale_ms = self.inhale_ms.unwrap_or(pattern.inhale_ms);
        pattern.hold_after_inhale_ms = self.hold_in_ms.unwrap_or(pattern.hold_after_inhale_ms);
        pattern.exhale_ms = self.exhale_ms.unwrap_or(pattern.exhale_ms);
        pattern.hold_after_exhale_ms = self.hold_out_ms.unwrap_or(pattern.hold_after_exhale_ms);
        pattern.resolve()
    }
}

#[derive(Subcommand)]
pub enum BreatheAction {
    /// Run a live session, printing events as JSON lines until Ctrl-C
    Run {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Stop after this many completed breaths
        #[arg(long)]
        cycles: Option<u64>,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Run on simulated time and print every event
    Simulate {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Simulated run length in milliseconds
        #[arg(long, default_value = "16000")]
        until_ms: u64,
        /// Simulated frame interval in milliseconds
        #[arg(long, default_value = "16")]
        step_ms: u64,
        /// Switch to this preset mid-run
        #[arg(long, requires = "switch_at_ms")]
        switch_to: Option<String>,
        /// When to switch, in simulated milliseconds
        #[arg(long, requires = "switch_to")]
        switch_at_ms: Option<u64>,
    },
}

struct SessionSummary {
    duration_ms: u64,
    breaths: u64,
}

pub fn run(action: BreatheAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        BreatheAction::Run {
            pattern,
            cycles,
            seconds,
        } => {
            let pattern = pattern.resolve(&config)?;
            let subscription = StaticSubscription(config.session.subscribed);
            let mut store = SessionStore::new(Database::open()?, config.session.free_session_limit);

            if let Access::Paywalled {
                session_count,
                free_limit,
            } = Paywall::check(&store, &subscription)?
            {
                emit(&Event::Paywalled {
                    session_count,
                    free_limit,
                    at: Utc::now(),
                })?;
                return Err("free sessions used up; subscribe to continue".into());
            }

            let gate = store.record_session_start()?;
            emit(&Event::SessionStarted {
                pattern,
                gate,
                at: Utc::now(),
            })?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let summary = runtime.block_on(drive(pattern, &config.engine, cycles, seconds))?;

            store.record_session_end(summary.duration_ms)?;
            emit(&Event::SessionEnded {
                duration_ms: summary.duration_ms,
                breaths: summary.breaths,
                at: Utc::now(),
            })?;
        }
        BreatheAction::Simulate {
            pattern,
            until_ms,
            step_ms,
            switch_to,
            switch_at_ms,
        } => {
            let pattern = pattern.resolve(&config)?;
            let switch = match (switch_to, switch_at_ms) {
                (Some(slug), Some(at)) => Some((at, preset(&slug)?.pattern)),
                _ => None,
            };
            simulate(pattern, &config.engine, until_ms, step_ms, switch)?;
        }
    }
    Ok(())
}

/// Drive the engine from a frame interval and a one-second countdown
/// interval on a single task, so callbacks never overlap.
async fn drive(
    pattern: BreathPattern,
    engine_config: &EngineConfig,
    cycles: Option<u64>,
    seconds: Option<u64>,
) -> Result<SessionSummary, Box<dyn std::error::Error>> {
    let mut engine = BreathEngine::new(SystemClock::new()).with_overshoot(engine_config.overshoot);
    let mut countdown = HoldCountdown::new();
    let mut breaths = BreathCounter::new();

    let first = engine.start(pattern)?;
    breaths.begin();
    emit(&Event::phase_changed(&first, breaths.count(), engine.clock().now_ms()))?;

    let mut frames = time::interval(Duration::from_millis(engine_config.frame_interval_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut second_ticks = time::interval(Duration::from_secs(1));
    second_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = async move {
        match seconds {
            Some(s) => time::sleep(Duration::from_secs(s)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let Some(event) = engine.tick_now() else { continue };
                breaths.observe(&event);
                emit(&Event::phase_changed(&event, breaths.count(), engine.clock().now_ms()))?;
                if let Some(secs) = countdown.observe(&event) {
                    second_ticks.reset();
                    emit(&Event::hold_countdown(secs))?;
                }
                if cycles.is_some_and(|n| breaths.completed_cycles() >= n) {
                    break;
                }
            }
            _ = second_ticks.tick() => {
                if let Some(secs) = countdown.tick() {
                    emit(&Event::hold_countdown(secs))?;
                }
            }
            _ = &mut deadline => break,
            res = &mut ctrl_c => {
                res?;
                break;
            }
        }
    }

    let duration_ms = engine.clock().now_ms();
    engine.stop();
    countdown.clear();
    Ok(SessionSummary {
        duration_ms,
        breaths: breaths.count(),
    })
}

/// Deterministic run on a [`ManualClock`]. Does not count as a session.
fn simulate(
    pattern: BreathPattern,
    engine_config: &EngineConfig,
    until_ms: u64,
    step_ms: u64,
    mut switch: Option<(u64, BreathPattern)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = ManualClock::new(0);
    let mut engine = BreathEngine::new(clock.clone()).with_overshoot(engine_config.overshoot);
    let mut countdown = HoldCountdown::new();
    let mut breaths = BreathCounter::new();

    let first = engine.start(pattern)?;
    breaths.begin();
    emit(&Event::phase_changed(&first, breaths.count(), 0))?;

    let step_ms = step_ms.max(1);
    let mut next_second: Option<u64> = None;
    let mut t = 0;
    while t < until_ms {
        t = t.saturating_add(step_ms).min(until_ms);
        clock.set(t);

        if let Some((at, new_pattern)) = switch {
            if t >= at {
                engine.set_pattern(new_pattern)?;
                emit(&Event::PatternChanged {
                    pattern: new_pattern,
                    at: Utc::now(),
                })?;
                switch = None;
            }
        }

        if let Some(event) = engine.tick(t) {
            breaths.observe(&event);
            emit(&Event::phase_changed(&event, breaths.count(), t))?;
            next_second = None;
            if let Some(secs) = countdown.observe(&event) {
                next_second = Some(t + 1000);
                emit(&Event::hold_countdown(secs))?;
            }
        }

        // Simulated one-second interval, re-armed on each hold.
        while let Some(due) = next_second.filter(|due| t >= *due) {
            if let Some(secs) = countdown.tick() {
                emit(&Event::hold_countdown(secs))?;
            }
            next_second = Some(due + 1000);
        }
    }

    emit(&engine.snapshot())?;
    engine.stop();
    Ok(())
}
