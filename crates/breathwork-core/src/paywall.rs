//! Free-session limit and subscription gate.
//!
//! The engine never calls into this module. The host consults [`Paywall`]
//! before starting a session and reports session boundaries to a
//! [`SessionCounter`].

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

pub const DEFAULT_FREE_SESSION_LIMIT: u64 = 3;

/// Session count relative to the free limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGate {
    pub session_count: u64,
    pub free_limit: u64,
    pub limit_reached: bool,
    pub remaining_free_sessions: u64,
}

impl SessionGate {
    pub fn new(session_count: u64, free_limit: u64) -> Self {
        Self {
            session_count,
            free_limit,
            limit_reached: session_count >= free_limit,
            remaining_free_sessions: free_limit.saturating_sub(session_count),
        }
    }
}

/// Counts sessions toward the free limit.
pub trait SessionCounter {
    /// Current count without recording anything.
    fn gate(&self) -> Result<SessionGate>;

    /// Count a new session.
    fn record_session_start(&mut self) -> Result<SessionGate>;

    /// Note that a session ended after `duration_ms`. Does not change the count.
    fn record_session_end(&mut self, duration_ms: u64) -> Result<SessionGate> {
        let gate = self.gate()?;
        info!(duration_ms, session_count = gate.session_count, "session ended");
        Ok(gate)
    }
}

pub trait SubscriptionStatus {
    fn is_subscribed(&self) -> bool;
}

/// Subscription status known up front, e.g. from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSubscription(pub bool);

impl SubscriptionStatus for StaticSubscription {
    fn is_subscribed(&self) -> bool {
        self.0
    }
}

/// Counter that lives only as long as the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InMemorySessionCounter {
    count: u64,
    free_limit: u64,
}

impl InMemorySessionCounter {
    pub fn new(free_limit: u64) -> Self {
        Self {
            count: 0,
            free_limit,
        }
    }
}

impl Default for InMemorySessionCounter {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_SESSION_LIMIT)
    }
}

impl SessionCounter for InMemorySessionCounter {
    fn gate(&self) -> Result<SessionGate> {
        Ok(SessionGate::new(self.count, self.free_limit))
    }

    fn record_session_start(&mut self) -> Result<SessionGate> {
        self.count += 1;
        self.gate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum Access {
    Granted,
    Paywalled { session_count: u64, free_limit: u64 },
}

/// Decides whether another session may start.
pub struct Paywall;

impl Paywall {
    /// Subscribers always pass; everyone else until the free limit is reached.
    pub fn check(
        counter: &impl SessionCounter,
        subscription: &impl SubscriptionStatus,
    ) -> Result<Access> {
        if subscription.is_subscribed() {
            return Ok(Access::Granted);
        }
        let gate = counter.gate()?;
        if gate.limit_reached {
            info!(session_count = gate.session_count, "free session limit reached");
            Ok(Access::Paywalled {
                session_count: gate.session_count,
                free_limit: gate.free_limit,
            })
        } else {
            Ok(Access::Granted)
        }
    }
}
