//! Per-operation deadline policy.
//!
//! A pure lookup: no shared state, safe to call from any number of
//! concurrent logical requests.

use ledgerly_gateway_core::OperationKind;
use std::time::Duration;

/// Maps (operation kind, attempt number, cold start) to a deadline.
///
/// Base deadlines reflect how much work each operation asks of the
/// backend; the cold-start base covers loading model weights after
/// idle. Each retry attempt stretches the base by the retry multiplier,
/// since a backend that missed one deadline is often just slow, not
/// dead.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutPolicy {
    pub(crate) health: Duration,
    pub(crate) parse: Duration,
    pub(crate) chat: Duration,
    pub(crate) analyze: Duration,
    pub(crate) cold_start: Duration,
    pub(crate) retry_multiplier: f64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            parse: Duration::from_secs(15),
            chat: Duration::from_secs(30),
            analyze: Duration::from_secs(60),
            cold_start: Duration::from_secs(90),
            retry_multiplier: 1.5,
        }
    }
}

impl TimeoutPolicy {
    /// Sets the base deadline for health-check calls.
    pub fn health(mut self, timeout: Duration) -> Self {
        self.health = timeout;
        self
    }

    /// Sets the base deadline for parse calls.
    pub fn parse(mut self, timeout: Duration) -> Self {
        self.parse = timeout;
        self
    }

    /// Sets the base deadline for chat calls.
    pub fn chat(mut self, timeout: Duration) -> Self {
        self.chat = timeout;
        self
    }

    /// Sets the base deadline for analyze calls.
    pub fn analyze(mut self, timeout: Duration) -> Self {
        self.analyze = timeout;
        self
    }

    /// Sets the deadline used while the backend loads model weights.
    pub fn cold_start(mut self, timeout: Duration) -> Self {
        self.cold_start = timeout;
        self
    }

    /// Sets the per-retry deadline stretch factor.
    pub fn retry_multiplier(mut self, multiplier: f64) -> Self {
        self.retry_multiplier = multiplier;
        self
    }

    /// Returns the base deadline for an operation, before any retry
    /// escalation.
    pub fn base_for(&self, kind: OperationKind, is_cold_start: bool) -> Duration {
        if is_cold_start {
            return self.cold_start;
        }
        match kind {
            OperationKind::Health => self.health,
            OperationKind::Parse => self.parse,
            OperationKind::Chat => self.chat,
            OperationKind::Analyze => self.analyze,
        }
    }

    /// Computes the deadline for a given attempt.
    ///
    /// Attempt numbers are zero-based; attempt `n` gets the base
    /// multiplied by `retry_multiplier^n`. Attempt numbers beyond the
    /// retry cap are never requested by the caller.
    pub fn deadline_for(&self, kind: OperationKind, attempt: u32, is_cold_start: bool) -> Duration {
        let base = self.base_for(kind, is_cold_start);
        base.mul_f64(self.retry_multiplier.powi(attempt as i32))
    }
}
