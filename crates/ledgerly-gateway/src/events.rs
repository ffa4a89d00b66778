//! Events emitted by the gateway's stateful components.

use crate::circuit::CircuitState;
use ledgerly_gateway_core::events::ObservabilityEvent;
use ledgerly_gateway_core::OperationKind;
use std::time::{Duration, Instant};

/// Events emitted by the circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitEvent {
    /// The breaker moved between states.
    StateTransition {
        instance: String,
        timestamp: Instant,
        from: CircuitState,
        to: CircuitState,
    },
    /// A call was allowed through (includes the half-open probe).
    CallPermitted {
        instance: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected without touching the backend.
    CallRejected {
        instance: String,
        timestamp: Instant,
    },
    /// A success outcome was recorded.
    SuccessRecorded {
        instance: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A failure outcome was recorded.
    FailureRecorded {
        instance: String,
        timestamp: Instant,
        state: CircuitState,
        consecutive_failures: u32,
    },
}

impl ObservabilityEvent for CircuitEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitEvent::StateTransition { .. } => "state_transition",
            CircuitEvent::CallPermitted { .. } => "call_permitted",
            CircuitEvent::CallRejected { .. } => "call_rejected",
            CircuitEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitEvent::StateTransition { timestamp, .. }
            | CircuitEvent::CallPermitted { timestamp, .. }
            | CircuitEvent::CallRejected { timestamp, .. }
            | CircuitEvent::SuccessRecorded { timestamp, .. }
            | CircuitEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            CircuitEvent::StateTransition { instance, .. }
            | CircuitEvent::CallPermitted { instance, .. }
            | CircuitEvent::CallRejected { instance, .. }
            | CircuitEvent::SuccessRecorded { instance, .. }
            | CircuitEvent::FailureRecorded { instance, .. } => instance,
        }
    }
}

/// Events emitted by the admission queue.
#[derive(Debug, Clone)]
pub enum AdmissionEvent {
    /// A caller acquired a concurrency slot.
    SlotAcquired {
        instance: String,
        timestamp: Instant,
        in_flight: usize,
        waited: Duration,
    },
    /// A caller gave up waiting before a slot freed.
    QueueTimeout {
        instance: String,
        timestamp: Instant,
        waited: Duration,
    },
}

impl ObservabilityEvent for AdmissionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdmissionEvent::SlotAcquired { .. } => "slot_acquired",
            AdmissionEvent::QueueTimeout { .. } => "queue_timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            AdmissionEvent::SlotAcquired { timestamp, .. }
            | AdmissionEvent::QueueTimeout { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            AdmissionEvent::SlotAcquired { instance, .. }
            | AdmissionEvent::QueueTimeout { instance, .. } => instance,
        }
    }
}

/// Events emitted by the retrying caller and the gateway facade.
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// The backend answered within the attempt budget.
    Succeeded {
        instance: String,
        timestamp: Instant,
        kind: OperationKind,
        attempts: u32,
    },
    /// A transient failure will be retried after a backoff sleep.
    Retrying {
        instance: String,
        timestamp: Instant,
        kind: OperationKind,
        attempt: u32,
        delay: Duration,
    },
    /// The backend rejected the payload; no retry, no breaker count.
    ClientRejected {
        instance: String,
        timestamp: Instant,
        kind: OperationKind,
    },
    /// All attempts were used up without a success.
    Exhausted {
        instance: String,
        timestamp: Instant,
        kind: OperationKind,
        attempts: u32,
    },
    /// The facade served a rule-based degraded response.
    FallbackServed {
        instance: String,
        timestamp: Instant,
        kind: OperationKind,
    },
}

impl ObservabilityEvent for CallEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CallEvent::Succeeded { .. } => "succeeded",
            CallEvent::Retrying { .. } => "retrying",
            CallEvent::ClientRejected { .. } => "client_rejected",
            CallEvent::Exhausted { .. } => "exhausted",
            CallEvent::FallbackServed { .. } => "fallback_served",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CallEvent::Succeeded { timestamp, .. }
            | CallEvent::Retrying { timestamp, .. }
            | CallEvent::ClientRejected { timestamp, .. }
            | CallEvent::Exhausted { timestamp, .. }
            | CallEvent::FallbackServed { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            CallEvent::Succeeded { instance, .. }
            | CallEvent::Retrying { instance, .. }
            | CallEvent::ClientRejected { instance, .. }
            | CallEvent::Exhausted { instance, .. }
            | CallEvent::FallbackServed { instance, .. } => instance,
        }
    }
}
