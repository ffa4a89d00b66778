//! Process-lifetime gateway counters.

use crate::circuit::CircuitState;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters shared by every logical request of one gateway.
///
/// Counters only grow; [`GatewayStats::reset`] exists for explicit
/// operator action and nothing else.
#[derive(Debug, Default)]
pub struct GatewayStats {
    admitted: AtomicU64,
    queue_timeouts: AtomicU64,
    circuit_rejections: AtomicU64,
    retries: AtomicU64,
    fallbacks: AtomicU64,
}

impl GatewayStats {
    pub(crate) fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queue_timeout(&self) {
        self.queue_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_circuit_rejection(&self) {
        self.circuit_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Clears every counter. Operator action only.
    pub fn reset(&self) {
        self.admitted.store(0, Ordering::Relaxed);
        self.queue_timeouts.store(0, Ordering::Relaxed);
        self.circuit_rejections.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        circuit_state: CircuitState,
        in_flight: usize,
    ) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            queue_timeouts: self.queue_timeouts.load(Ordering::Relaxed),
            circuit_rejections: self.circuit_rejections.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            circuit_state,
            in_flight,
        }
    }
}

/// Point-in-time view of the gateway, serializable for a monitoring or
/// health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GatewayStatsSnapshot {
    /// Total calls that acquired an admission slot.
    pub admitted: u64,
    /// Total calls that gave up waiting for admission.
    pub queue_timeouts: u64,
    /// Total calls rejected by the circuit breaker.
    pub circuit_rejections: u64,
    /// Total retry attempts performed (excludes first attempts).
    pub retries: u64,
    /// Total degraded responses served.
    pub fallbacks: u64,
    /// Circuit state at snapshot time.
    pub circuit_state: CircuitState,
    /// Admission slots held at snapshot time.
    pub in_flight: usize,
}
